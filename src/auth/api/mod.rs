//! API接口层

pub mod handlers;
pub mod routes;

pub use routes::{create_auth_routes, AuthState};
