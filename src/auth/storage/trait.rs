//! 存储层trait定义

use async_trait::async_trait;

use crate::auth::{
    errors::AuthError,
    types::{NewAccount, UserAccount},
};

/// Account persistence consumed by the auth core.
///
/// Emails passed in are already normalized. `create` must reject a duplicate email
/// with [`AuthError::EmailExists`] atomically with the insert; the identity linker
/// relies on that to detect a concurrent registration.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new account, assigning `id` and `created_at`.
    async fn create(&self, account: NewAccount) -> Result<UserAccount, AuthError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserAccount>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError>;

    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<UserAccount>, AuthError>;

    /// Replace the stored record with the same id. `id`, `email` and `created_at` are not changed.
    async fn update(&self, account: &UserAccount) -> Result<(), AuthError>;
}
