//! External identity -> local account reconciliation

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{
    errors::AuthError,
    storage::CredentialStore,
    types::{normalize_email, ExternalProfile, NewAccount, Provider, UserAccount},
};

/// Creating the account can lose a race to a concurrent registration this many times.
const MAX_CREATE_ATTEMPTS: usize = 3;

/// Resolves an external profile to exactly one local account.
pub struct OAuthIdentityLinker {
    store: Arc<dyn CredentialStore>,
}

impl OAuthIdentityLinker {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returning user by external id, else merge into the account with the same email,
    /// else create a new external account.
    ///
    /// Merging switches `provider` to external; the stored password hash is kept but
    /// password sign-in is refused from then on.
    pub async fn link(&self, profile: &ExternalProfile) -> Result<UserAccount, AuthError> {
        if let Some(user) = self.store.find_by_external_id(&profile.external_id).await? {
            return Ok(user);
        }

        let email = normalize_email(&profile.email);
        if email.is_empty() {
            return Err(AuthError::OAuth("external profile has no email".to_string()));
        }

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            if let Some(existing) = self.store.find_by_email(&email).await? {
                return self.attach(existing, profile).await;
            }

            let created = self
                .store
                .create(NewAccount {
                    email: email.clone(),
                    name: profile.display_name.clone(),
                    password_hash: None,
                    external_id: Some(profile.external_id.clone()),
                    provider: Provider::External,
                    picture_url: profile.picture_url.clone(),
                })
                .await;

            match created {
                Ok(user) => {
                    info!(user_id = %user.id, "created account for external identity");
                    return Ok(user);
                }
                Err(AuthError::EmailExists) => {
                    warn!(attempt, "account created concurrently; re-resolving by email");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::Internal(
            "could not resolve external identity after concurrent account creation".to_string(),
        ))
    }

    async fn attach(
        &self,
        mut user: UserAccount,
        profile: &ExternalProfile,
    ) -> Result<UserAccount, AuthError> {
        user.external_id = Some(profile.external_id.clone());
        user.provider = Provider::External;
        user.picture_url = profile.picture_url.clone();
        self.store.update(&user).await?;

        info!(user_id = %user.id, "linked external identity to existing account");
        Ok(user)
    }
}
