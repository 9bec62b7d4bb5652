//! OAuth2 login against an external identity provider.
//!
//! The flow per session is `Anonymous -> StatePending -> Authenticated`:
//! - `/login` stores a random CSRF state and redirects to the provider
//! - the callback checks the state, exchanges the code and fetches the identity
//! - the identity is cached in the session and later requests reuse it
//!
//! Session writes happen only after both provider calls succeed, so a request
//! dropped half way through leaves the session as it was.

use crate::app_config::OAuthCredentials;
use crate::error::{ApiError, MSG_INVALID_STATE};
use crate::ident::{IdGenerator, ID_LENGTH};
use crate::session::{ACCOUNT_KEY, IDENTITY_KEY, REDIRECT_KEY, STATE_KEY};
use actix_session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const GOOGLE_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

/// Who the provider says the user is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken(pub String);

/// Identity provider failure
#[derive(Debug)]
pub enum ProviderError {
    /// Request could not be sent or timed out
    Network(String),
    /// Provider answered with a non-success status
    Status(u16, String),
    /// Response body did not have the expected shape
    InvalidResponse(String),
    /// Configured endpoint is not a valid URL
    InvalidUrl(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Network(e) => write!(f, "Provider network error: {}", e),
            ProviderError::Status(code, body) => {
                write!(f, "Provider returned status {}: {}", code, body)
            }
            ProviderError::InvalidResponse(e) => write!(f, "Invalid provider response: {}", e),
            ProviderError::InvalidUrl(e) => write!(f, "Invalid provider URL: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// An OAuth2 authorization code provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to, carrying `state`.
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError>;

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError>;

    async fn fetch_identity(&self, token: &AccessToken) -> Result<Identity, ProviderError>;
}

/// Client registration and endpoints, built once at startup.
#[derive(Clone, Debug)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl OAuthConfig {
    pub fn google(credentials: &OAuthCredentials, redirect_url: String) -> Self {
        Self {
            client_id: credentials.clientid.clone(),
            client_secret: credentials.secret.clone(),
            redirect_url,
            scopes: vec![GOOGLE_EMAIL_SCOPE.to_string()],
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleProvider {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: OAuthConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError> {
        let scope = self.config.scopes.join(" ");
        let url = url::Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status(status.as_u16(), body));
        }

        let token: TokenResponse = response.json().await?;
        Ok(AccessToken(token.access_token))
    }

    async fn fetch_identity(&self, token: &AccessToken) -> Result<Identity, ProviderError> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.0)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status(status.as_u16(), body));
        }

        let identity: Identity = response.json().await?;
        if identity.email.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "identity has no email".to_string(),
            ));
        }
        Ok(identity)
    }
}

/// A post-login target must be a path on this origin.
pub fn is_safe_redirect(from: &str) -> bool {
    from.starts_with('/') && !from.starts_with("//") && !from.starts_with("/\\")
}

#[derive(Clone)]
pub struct OAuthSessionFlow {
    provider: Arc<dyn IdentityProvider>,
    ids: Arc<IdGenerator>,
}

impl OAuthSessionFlow {
    pub fn new(provider: Arc<dyn IdentityProvider>, ids: Arc<IdGenerator>) -> Self {
        Self { provider, ids }
    }

    /// Start a login. Returns the provider URL to redirect to.
    pub fn initiate_login(&self, session: &Session, from: Option<&str>) -> Result<String, ApiError> {
        let state = self.ids.generate(ID_LENGTH);
        let url = self
            .provider
            .authorize_url(&state)
            .map_err(ApiError::internal)?;

        match from.filter(|f| !f.is_empty()) {
            Some(from) if is_safe_redirect(from) => session.insert(REDIRECT_KEY, from)?,
            Some(from) => {
                log::warn!("Ignoring invalid login redirect target: {:?}", from);
                session.remove(REDIRECT_KEY);
            }
            None => {
                session.remove(REDIRECT_KEY);
            }
        }
        session.insert(STATE_KEY, &state)?;

        Ok(url)
    }

    /// The identity cached by an earlier successful callback, if any.
    pub fn cached_identity(&self, session: &Session) -> Result<Option<Identity>, ApiError> {
        Ok(session.get::<Identity>(IDENTITY_KEY)?)
    }

    /// Resolve the session's identity, completing a pending login with
    /// `state` and `code` when nothing is cached yet.
    pub async fn authenticate(
        &self,
        session: &Session,
        state: &str,
        code: &str,
    ) -> Result<Identity, ApiError> {
        if let Some(identity) = self.cached_identity(session)? {
            return Ok(identity);
        }

        let expected = session.get::<String>(STATE_KEY)?.unwrap_or_default();
        if expected.is_empty() || state.is_empty() || expected != state {
            log::warn!("OAuth callback with invalid session state");
            return Err(ApiError::Auth(MSG_INVALID_STATE));
        }

        let token = self
            .provider
            .exchange_code(code)
            .await
            .map_err(|e| ApiError::TokenExchange(e.to_string()))?;

        let identity = self
            .provider
            .fetch_identity(&token)
            .await
            .map_err(|e| ApiError::Identity(e.to_string()))?;

        session.insert(IDENTITY_KEY, &identity)?;
        session.remove(STATE_KEY);
        log::info!("Authenticated {}", identity.email);

        Ok(identity)
    }

    /// Post-login target stored by `initiate_login`, consumed on read.
    pub fn take_redirect(&self, session: &Session) -> String {
        let target = session
            .get::<String>(REDIRECT_KEY)
            .ok()
            .flatten()
            .filter(|t| is_safe_redirect(t));
        session.remove(REDIRECT_KEY);
        target.unwrap_or_else(|| "/".to_string())
    }

    pub fn logout(&self, session: &Session) {
        session.remove(IDENTITY_KEY);
        session.remove(ACCOUNT_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleProvider {
        let creds = OAuthCredentials::parse(r#"{"clientid":"client-1","secret":"s"}"#).unwrap();
        let config = OAuthConfig::google(&creds, "https://x.test/auth/google/callback".into());
        GoogleProvider::new(config, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_authorize_url_carries_state() {
        let url = url::Url::parse(&provider().authorize_url("abcDEF123456").unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(pairs["state"], "abcDEF123456");
        assert_eq!(pairs["client_id"], "client-1");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], "https://x.test/auth/google/callback");
        assert_eq!(pairs["scope"], GOOGLE_EMAIL_SCOPE);
    }

    #[test]
    fn test_safe_redirect() {
        assert!(is_safe_redirect("/"));
        assert!(is_safe_redirect("/poll/abc?x=1"));
        assert!(!is_safe_redirect(""));
        assert!(!is_safe_redirect("https://evil.example"));
        assert!(!is_safe_redirect("//evil.example"));
        assert!(!is_safe_redirect("/\\evil.example"));
        assert!(!is_safe_redirect("poll"));
    }

    #[test]
    fn test_identity_name_optional() {
        let identity: Identity = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(identity.name, "");
    }
}
