//! 认证服务（整合层）

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{
    config::AuthConfig,
    core::{
        OAuthIdentityLinker, PasswordHasher, ResetTokenError, ResetTokenStatus, ResetTokenStore,
        SessionTokenStore,
    },
    errors::AuthError,
    gate::{AuthorizationGate, Identity},
    providers::{GoogleProvider, OAuthProvider},
    storage::CredentialStore,
    types::*,
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// 认证服务（门面模式）
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    sessions: Arc<SessionTokenStore>,
    resets: Arc<ResetTokenStore>,
    linker: OAuthIdentityLinker,
    provider: Arc<dyn OAuthProvider>,
    config: AuthConfig,
}

impl AuthService {
    /// 创建新的认证服务 with Google as the OAuth provider
    ///
    /// # Errors
    /// `AuthError::Internal` when the configured scrypt cost or a token lifetime is out of range
    pub fn new(store: Arc<dyn CredentialStore>, config: AuthConfig) -> Result<Self, AuthError> {
        let provider = Arc::new(GoogleProvider::new(&config.oauth));
        Self::with_provider(store, provider, config)
    }

    pub fn with_provider(
        store: Arc<dyn CredentialStore>,
        provider: Arc<dyn OAuthProvider>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        config.validate()?;
        let hasher = PasswordHasher::new(config.password)?;

        Ok(Self {
            linker: OAuthIdentityLinker::new(store.clone()),
            store,
            hasher,
            sessions: Arc::new(SessionTokenStore::new()),
            resets: Arc::new(ResetTokenStore::new(config.reset_token_ttl())),
            provider,
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn sessions(&self) -> Arc<SessionTokenStore> {
        self.sessions.clone()
    }

    pub fn resets(&self) -> Arc<ResetTokenStore> {
        self.resets.clone()
    }

    /// Gate bound to this service's session store and cookie name.
    pub fn gate(&self) -> AuthorizationGate {
        AuthorizationGate::new(self.sessions.clone(), self.config.cookie_name.as_str())
    }

    /// Start the periodic expiry sweep for both token stores, unless disabled.
    pub fn spawn_sweepers(&self) -> Vec<JoinHandle<()>> {
        match self.config.sweep_interval() {
            Some(every) => vec![
                self.sessions.clone().spawn_sweeper(every),
                self.resets.clone().spawn_sweeper(every),
            ],
            None => Vec::new(),
        }
    }

    /// user注册
    pub async fn register(&self, req: RegisterRequest) -> Result<SessionGrant, AuthError> {
        let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
            return Err(AuthError::Validation("Email and password are required".to_string()));
        };
        let email = normalize_email(&email);

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let password_hash = self.hasher.spawn_hash(password).await?;
        let user = self
            .store
            .create(NewAccount {
                email,
                name: req.name,
                password_hash: Some(password_hash),
                external_id: None,
                provider: Provider::Local,
                picture_url: None,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(self.mint_session(user))
    }

    /// user登录
    pub async fn login(&self, req: LoginRequest) -> Result<SessionGrant, AuthError> {
        let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
            return Err(AuthError::Validation("Email and password are required".to_string()));
        };

        let user = self
            .authenticate(Credential::LocalCredential { email, password })
            .await?;
        Ok(self.mint_session(user))
    }

    /// Resolve a presented credential to its account without minting a session.
    pub async fn authenticate(&self, credential: Credential) -> Result<UserAccount, AuthError> {
        match credential {
            Credential::LocalCredential { email, password } => {
                let user = self
                    .store
                    .find_by_email(&normalize_email(&email))
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;

                let Some(hash) = user.password_hash.clone().filter(|_| user.accepts_password_login())
                else {
                    let provider = match user.provider {
                        Provider::External => self.provider.name(),
                        Provider::Local => user.provider.as_str(),
                    };
                    warn!(user_id = %user.id, provider, "password login on account without a password");
                    return Err(AuthError::ProviderMismatch {
                        provider: provider.to_string(),
                    });
                };

                if !self.hasher.spawn_verify(password, hash).await? {
                    warn!(user_id = %user.id, "password login rejected");
                    return Err(AuthError::InvalidCredentials);
                }
                Ok(user)
            }
            Credential::ExternalIdentity(profile) => self.linker.link(&profile).await,
        }
    }

    /// user登出; always succeeds.
    pub fn logout(&self, token: Option<&str>) {
        if let Some(token) = token {
            self.sessions.destroy(token);
            debug!("session destroyed");
        }
    }

    pub async fn current_user(&self, identity: &Identity) -> Result<UserAccount, AuthError> {
        self.store
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    /// Issue a reset token. The response is the same whether or not the account exists.
    pub async fn forgot_password(
        &self,
        req: ForgotPasswordRequest,
    ) -> Result<ForgotPasswordResponse, AuthError> {
        let email = non_empty(req.email)
            .ok_or_else(|| AuthError::Validation("Email is required".to_string()))?;

        let mut response = ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
            reset_token: None,
        };

        let Some(user) = self.store.find_by_email(&normalize_email(&email)).await? else {
            debug!("password reset requested for unknown email");
            return Ok(response);
        };

        let token = self.resets.create(&user.id, &user.email);
        info!(user_id = %user.id, "password reset token issued");

        if self.config.expose_reset_token {
            debug!(
                "Reset URL: {}/reset-password?token={}",
                self.config.frontend_url.trim_end_matches('/'),
                token
            );
            response.reset_token = Some(token);
        }
        Ok(response)
    }

    /// Email bound to a live reset token. The token is not consumed.
    pub fn validate_reset_token(&self, token: &str) -> Result<String, AuthError> {
        match self.resets.validate(token) {
            ResetTokenStatus::Valid { email } => Ok(email),
            ResetTokenStatus::Expired => Err(AuthError::ResetTokenExpired),
            ResetTokenStatus::NotFound => Err(AuthError::ResetTargetMissing),
        }
    }

    /// Consume a reset token and replace the account's password hash.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AuthError> {
        let (Some(token), Some(new_password)) = (non_empty(req.token), non_empty(req.new_password))
        else {
            return Err(AuthError::Validation(
                "Reset token and new password are required".to_string(),
            ));
        };
        self.check_password_length(&new_password)?;

        let grant = self.resets.consume(&token).map_err(|e| {
            warn!(reason = %e, "reset token rejected");
            match e {
                ResetTokenError::Expired => AuthError::ResetTokenExpired,
                ResetTokenError::NotFound => AuthError::InvalidResetToken,
            }
        })?;

        let Some(mut user) = self.store.find_by_id(&grant.user_id).await? else {
            warn!(user_id = %grant.user_id, "reset token for deleted account");
            return Err(AuthError::ResetTargetMissing);
        };

        user.password_hash = Some(self.hasher.spawn_hash(new_password).await?);
        self.store.update(&user).await?;

        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// 修改Password
    ///
    /// The current password is only checked for local accounts; an externally linked
    /// account sets a password here and becomes local again.
    pub async fn change_password(
        &self,
        identity: &Identity,
        req: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let (Some(current), Some(new_password)) =
            (non_empty(req.current_password), non_empty(req.new_password))
        else {
            return Err(AuthError::Validation(
                "Current password and new password are required".to_string(),
            ));
        };
        self.check_password_length(&new_password)?;

        let mut user = self
            .store
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.provider == Provider::Local {
            let matches = match user.password_hash.clone() {
                Some(hash) => self.hasher.spawn_verify(current, hash).await?,
                None => false,
            };
            if !matches {
                warn!(user_id = %user.id, "change password rejected");
                return Err(AuthError::IncorrectPassword);
            }
        }

        user.password_hash = Some(self.hasher.spawn_hash(new_password).await?);
        user.provider = Provider::Local;
        self.store.update(&user).await?;

        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Whether the OAuth provider has credentials.
    pub fn oauth_enabled(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn google_authorization_url(&self, state: &str) -> Result<String, AuthError> {
        self.provider.authorization_url(state)
    }

    /// Exchange an authorization code, link the identity and mint a session.
    pub async fn oauth_callback(&self, code: &str) -> Result<SessionGrant, AuthError> {
        let profile = self.provider.exchange_code(code).await?;
        let user = self.authenticate(Credential::ExternalIdentity(profile)).await?;

        info!(user_id = %user.id, provider = self.provider.name(), "OAuth sign-in");
        Ok(self.mint_session(user))
    }

    fn mint_session(&self, user: UserAccount) -> SessionGrant {
        let token = self.sessions.create(&user.id, self.config.token_max_age());
        SessionGrant { user, token }
    }

    fn check_password_length(&self, password: &str) -> Result<(), AuthError> {
        let min = self.config.password_min_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                min
            )));
        }
        Ok(())
    }
}
