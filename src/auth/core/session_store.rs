//! 会话存储 - opaque session tokens
//!
//! Token -> user id registry with absolute expiry. Entries are evicted lazily on
//! lookup; an optional sweeper task purges entries nobody looks up again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::{expiry_after, random_token};

#[derive(Clone, Debug)]
struct SessionEntry {
    user_id: String,
    expires_at: Instant,
}

/// Process-local session token registry
#[derive(Debug, Default)]
pub struct SessionTokenStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token bound to `user_id`, valid for `ttl`.
    pub fn create(&self, user_id: &str, ttl: Duration) -> String {
        let token = random_token();
        let entry = SessionEntry {
            user_id: user_id.to_string(),
            expires_at: expiry_after(ttl),
        };
        self.sessions.lock().insert(token.clone(), entry);

        tracing::debug!(user_id, ttl_secs = ttl.as_secs(), "session created");
        token
    }

    /// Return the owning user id for a live token. Expired entries are evicted in the same step.
    pub fn resolve(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get(token)?;

        if entry.expires_at > Instant::now() {
            return Some(entry.user_id.clone());
        }

        sessions.remove(token);
        tracing::debug!("expired session evicted on lookup");
        None
    }

    /// Remove a token. Unknown tokens are ignored.
    pub fn destroy(&self, token: &str) {
        if self.sessions.lock().remove(token).is_some() {
            tracing::debug!("session destroyed");
        }
    }

    /// Number of entries currently held, including expired ones not yet evicted.
    pub fn active_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    /// 启动定期清理任务
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    tracing::info!("Session cleanup: removed {} expired sessions", removed);
                }
            }
        })
    }
}
