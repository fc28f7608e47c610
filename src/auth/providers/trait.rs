//! OAuth提供商trait定义

use async_trait::async_trait;

use crate::auth::{errors::AuthError, types::ExternalProfile};

/// An external identity provider using the authorization-code flow.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Human-facing provider name, e.g. "Google"
    fn name(&self) -> &str;

    /// 是否已配置
    fn is_configured(&self) -> bool;

    /// URL the browser is sent to; `state` is echoed back on the callback.
    fn authorization_url(&self, state: &str) -> Result<String, AuthError>;

    /// Trade an authorization code for the user's profile.
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError>;
}
