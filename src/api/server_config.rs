//! 服务器配置常量

use std::time::Duration;

/// 并发连接限制
pub const MAX_CONCURRENCY: usize = 256;

/// 请求体大小限制
pub const MAX_BODY_SIZE: usize = 64 * 1024; // 64KB; auth bodies are tiny

/// 请求超时时间
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CORS最大缓存时间
pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);
