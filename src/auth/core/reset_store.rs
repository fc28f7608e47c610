//! Single-use password-reset tokens

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;

use super::{expiry_after, random_token};

/// Default validity window of a reset token
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
struct ResetEntry {
    user_id: String,
    email: String,
    expires_at: Instant,
}

impl ResetEntry {
    fn is_live(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// Result of a read-only token check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetTokenStatus {
    Valid { email: String },
    Expired,
    NotFound,
}

/// What a consumed token was bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetGrant {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ResetTokenError {
    #[error("reset token expired")]
    Expired,
    #[error("reset token not found")]
    NotFound,
}

/// Process-local registry of outstanding reset tokens
#[derive(Debug)]
pub struct ResetTokenStore {
    tokens: Mutex<HashMap<String, ResetEntry>>,
    ttl: Duration,
}

impl Default for ResetTokenStore {
    fn default() -> Self {
        Self::new(RESET_TOKEN_TTL)
    }
}

impl ResetTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a token for `user_id` / `email`.
    pub fn create(&self, user_id: &str, email: &str) -> String {
        let token = random_token();
        let entry = ResetEntry {
            user_id: user_id.to_string(),
            email: email.to_string(),
            expires_at: expiry_after(self.ttl),
        };
        self.tokens.lock().insert(token.clone(), entry);
        token
    }

    /// Check a token without consuming it. Expired entries are evicted.
    pub fn validate(&self, token: &str) -> ResetTokenStatus {
        let mut tokens = self.tokens.lock();
        let Some(entry) = tokens.get(token) else {
            return ResetTokenStatus::NotFound;
        };

        if entry.is_live(Instant::now()) {
            return ResetTokenStatus::Valid {
                email: entry.email.clone(),
            };
        }

        tokens.remove(token);
        ResetTokenStatus::Expired
    }

    /// Check and delete in one step. A token can be consumed at most once.
    pub fn consume(&self, token: &str) -> Result<ResetGrant, ResetTokenError> {
        let entry = self
            .tokens
            .lock()
            .remove(token)
            .ok_or(ResetTokenError::NotFound)?;

        if !entry.is_live(Instant::now()) {
            tracing::info!("expired reset token presented");
            return Err(ResetTokenError::Expired);
        }

        Ok(ResetGrant {
            user_id: entry.user_id,
            email: entry.email,
        })
    }

    /// Outstanding tokens, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut tokens = self.tokens.lock();
        let before = tokens.len();
        tokens.retain(|_, entry| entry.is_live(now));
        before - tokens.len()
    }

    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    tracing::info!("Reset token cleanup: removed {} expired tokens", removed);
                }
            }
        })
    }
}
