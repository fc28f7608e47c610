//! 核心业务逻辑层

pub mod password_service;
pub mod session_store;
pub mod reset_store;
pub mod identity_linker;

// 重新导出
pub use password_service::PasswordHasher;
pub use session_store::SessionTokenStore;
pub use reset_store::{ResetGrant, ResetTokenError, ResetTokenStatus, ResetTokenStore};
pub use identity_linker::OAuthIdentityLinker;

use std::time::Duration;

use rand::RngCore;
use tokio::time::Instant;

use crate::auth::config::MAX_LIFETIME_SECS;

/// Longest lifetime a token store will honor; larger values are clamped.
pub(crate) const MAX_TOKEN_TTL: Duration = Duration::from_secs(MAX_LIFETIME_SECS);

/// 256 random bits from the OS RNG, hex encoded.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Absolute expiry `ttl` from now, clamped to [`MAX_TOKEN_TTL`].
pub(crate) fn expiry_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl.min(MAX_TOKEN_TTL)).unwrap_or(now)
}
