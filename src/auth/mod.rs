//! user认证模块
//!
//! ## 架构设计
//!
//! ```text
//! auth/
//! ├── types.rs          # 类型定义
//! ├── errors.rs         # error类型
//! ├── config.rs         # 配置管理
//! ├── cookie.rs         # Cookie构建与读取
//! ├── gate.rs           # 认证中间件 (AuthorizationGate)
//! ├── service.rs        # 认证服务（门面）
//! ├── core/             # 核心业务逻辑层
//! │   ├── password_service.rs
//! │   ├── session_store.rs
//! │   ├── reset_store.rs
//! │   └── identity_linker.rs
//! ├── providers/        # OAuth提供商插件层
//! │   ├── trait.rs
//! │   └── google.rs
//! ├── storage/          # 存储抽象层
//! │   ├── trait.rs
//! │   └── memory.rs
//! └── api/              # API接口层
//!     ├── routes.rs
//!     └── handlers.rs
//! ```
//!
//! ## 设计原则
//!
//! - **分层架构**: API → 服务 → 存储
//! - **依赖注入**: stores and providers are injected as `Arc<dyn Trait>`
//! - Token stores are process-local and lost on restart

pub mod types;
pub mod errors;
pub mod config;
pub mod cookie;
pub mod gate;
pub mod service;
pub mod core;
pub mod providers;
pub mod storage;
pub mod api;

// 重新导出常用类型和函数
pub use types::{Credential, ExternalProfile, Provider, PublicUser, UserAccount};
pub use errors::AuthError;
pub use config::AuthConfig;
pub use gate::{AuthorizationGate, Identity};
pub use service::AuthService;
pub use api::{create_auth_routes, AuthState};
pub use storage::{CredentialStore, MemoryStorage};
