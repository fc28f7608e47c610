//! 内存存储实现（用于开发和测试）

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::r#trait::CredentialStore;
use crate::auth::{
    errors::AuthError,
    types::{normalize_email, NewAccount, UserAccount},
};

#[derive(Default)]
struct Inner {
    /// id -> account
    users: HashMap<String, UserAccount>,
    /// email -> id
    by_email: HashMap<String, String>,
    /// external id -> id
    by_external: HashMap<String, String>,
}

/// 内存存储
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryStorage {
    async fn create(&self, account: NewAccount) -> Result<UserAccount, AuthError> {
        let email = normalize_email(&account.email);
        let mut inner = self.inner.write().await;

        if inner.by_email.contains_key(&email) {
            return Err(AuthError::EmailExists);
        }
        if let Some(ext) = &account.external_id {
            if inner.by_external.contains_key(ext) {
                return Err(AuthError::Storage(format!(
                    "external id already linked: {}",
                    ext
                )));
            }
        }

        let user = UserAccount {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: account.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            password_hash: account.password_hash,
            external_id: account.external_id,
            provider: account.provider,
            picture_url: account.picture_url,
            created_at: Utc::now(),
        };

        inner.by_email.insert(email, user.id.clone());
        if let Some(ext) = &user.external_id {
            inner.by_external.insert(ext.clone(), user.id.clone());
        }
        inner.users.insert(user.id.clone(), user.clone());

        info!(user_id = %user.id, provider = user.provider.as_str(), "account created");
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserAccount>, AuthError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserAccount>, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external
            .get(external_id)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn update(&self, account: &UserAccount) -> Result<(), AuthError> {
        let mut inner = self.inner.write().await;

        let previous_external = match inner.users.get(&account.id) {
            Some(existing) => existing.external_id.clone(),
            None => return Err(AuthError::UserNotFound),
        };

        if let Some(ext) = &account.external_id {
            match inner.by_external.get(ext) {
                Some(owner) if owner != &account.id => {
                    return Err(AuthError::Storage(format!(
                        "external id already linked: {}",
                        ext
                    )));
                }
                _ => {}
            }
        }

        if previous_external != account.external_id {
            if let Some(old) = previous_external {
                inner.by_external.remove(&old);
            }
            if let Some(ext) = &account.external_id {
                inner.by_external.insert(ext.clone(), account.id.clone());
            }
        }

        if let Some(stored) = inner.users.get_mut(&account.id) {
            let created_at = stored.created_at;
            let email = stored.email.clone();
            *stored = UserAccount {
                email,
                created_at,
                ..account.clone()
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::Provider;

    fn local(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            name: Some("Test".to_string()),
            password_hash: Some("scrypt:aa:bb".to_string()),
            external_id: None,
            provider: Provider::Local,
            picture_url: None,
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();

        let user = storage.create(local(" Test@Example.com ")).await.unwrap();
        assert_eq!(user.email, "test@example.com");

        let found = storage.find_by_email("TEST@example.com").await.unwrap();
        assert_eq!(found.as_ref().map(|u| u.id.as_str()), Some(user.id.as_str()));

        let found_by_id = storage.find_by_id(&user.id).await.unwrap();
        assert!(found_by_id.is_some());
        assert!(storage.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let storage = MemoryStorage::new();
        storage.create(local("a@x.com")).await.unwrap();

        let result = storage.create(local("A@x.com")).await;
        assert!(matches!(result, Err(AuthError::EmailExists)));
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_maintains_external_index() {
        let storage = MemoryStorage::new();
        let mut user = storage.create(local("a@x.com")).await.unwrap();

        user.external_id = Some("g-1".to_string());
        user.provider = Provider::External;
        storage.update(&user).await.unwrap();

        let linked = storage.find_by_external_id("g-1").await.unwrap().unwrap();
        assert_eq!(linked.id, user.id);
        assert_eq!(linked.provider, Provider::External);
        assert_eq!(linked.password_hash.as_deref(), Some("scrypt:aa:bb"));
    }

    #[tokio::test]
    async fn test_update_keeps_immutable_fields() {
        let storage = MemoryStorage::new();
        let user = storage.create(local("a@x.com")).await.unwrap();

        let mut changed = user.clone();
        changed.email = "other@x.com".to_string();
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        storage.update(&changed).await.unwrap();

        let stored = storage.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
        assert_eq!(stored.created_at, user.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let storage = MemoryStorage::new();
        let ghost = storage.create(local("a@x.com")).await.unwrap();
        let other = MemoryStorage::new();
        assert!(matches!(other.update(&ghost).await, Err(AuthError::UserNotFound)));
    }
}
