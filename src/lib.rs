// src/lib.rs
//! Credential and session management for the data dashboard.
//!
//! Local email/password accounts, opaque session tokens, single-use password reset
//! tokens and Google sign-in, served as JSON under `/api/auth`.

pub mod api;
pub mod auth;
pub mod config;

pub use api::AppServer;
pub use config::AppConfig;
