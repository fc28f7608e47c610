//! 应用配置

pub mod env_config;

pub use env_config::{AppConfig, ServerConfig};
