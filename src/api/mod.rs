// src/api/mod.rs

pub mod handlers;
pub mod server;
pub mod server_config; // Server configuration constants

pub use server::AppServer;
