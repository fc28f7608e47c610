//! API Handlers 模块
//!
//! Server-level handlers; the auth handlers live in `crate::auth::api`.

pub mod health;

pub use health::health_check;
