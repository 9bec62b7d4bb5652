//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (`COOKIE_SECRET`, `DATABASE_URL`, `PORT`, ...)
//! 2. Config file (timeslot.toml)
//! 3. Default values
//!
//! Secrets like the cookie secret and OAuth credentials should be kept in
//! environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path of the callback route, appended to `base_url` to form the OAuth redirect.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

pub const MAX_SESSION_TTL_DAYS: i64 = 3650;
pub const MAX_HTTP_TIMEOUT_SECONDS: u64 = 300;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Secret the session signing key is derived from
    pub cookie_secret: String,
    pub database_url: String,
    /// External URL of this service, e.g. `https://timeslot.example.com`
    pub base_url: String,
    /// Listen port. Required, 0 means unset.
    pub port: u16,
    /// Path to a JSON file with the OAuth client id and secret
    pub oauth2_google_credentials_file: Option<String>,
    /// The same JSON inline. Only used when no file is configured.
    pub oauth2_google_credentials_contents: Option<String>,
    pub max_polls_per_account: u64,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_seconds: u64,
    pub session_ttl_days: i64,
    /// Timeout for calls to the identity provider
    pub http_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cookie_secret: String::new(),
            database_url: String::new(),
            base_url: String::new(),
            port: 0,
            oauth2_google_credentials_file: None,
            oauth2_google_credentials_contents: None,
            max_polls_per_account: 1000,
            rate_limit_max_requests: 10000,
            rate_limit_window_seconds: 3600,
            session_ttl_days: 30,
            http_timeout_seconds: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("timeslot.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment. `None` reads the process environment.
    pub fn load_with_env(
        path: &str,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g. DATABASE_URL -> database_url, MAX_POLLS_PER_ACCOUNT -> max_polls_per_account
            .add_source(Environment::default().try_parsing(true).source(env))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty required values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("COOKIE_SECRET", &self.cookie_secret),
            ("DATABASE_URL", &self.database_url),
            ("BASE_URL", &self.base_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "missing {} environment variable",
                    name
                )));
            }
        }

        if self.credentials_file().is_none() && self.credentials_contents().is_none() {
            return Err(ConfigError::Message(
                "missing oauth2 google credentials. Provide OAUTH2_GOOGLE_CREDENTIALS_FILE or OAUTH2_GOOGLE_CREDENTIALS_CONTENTS environment variable".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::Message(
                "missing PORT environment variable".to_string(),
            ));
        }

        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.session_ttl_days) {
            return Err(ConfigError::Message(format!(
                "SESSION_TTL_DAYS must be between 1 and {}",
                MAX_SESSION_TTL_DAYS
            )));
        }

        if !(1..=MAX_HTTP_TIMEOUT_SECONDS).contains(&self.http_timeout_seconds) {
            return Err(ConfigError::Message(format!(
                "HTTP_TIMEOUT_SECONDS must be between 1 and {}",
                MAX_HTTP_TIMEOUT_SECONDS
            )));
        }

        Ok(())
    }

    fn credentials_file(&self) -> Option<&str> {
        self.oauth2_google_credentials_file
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    fn credentials_contents(&self) -> Option<&str> {
        self.oauth2_google_credentials_contents
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Read the OAuth client credentials, preferring the file over inline contents.
    pub fn oauth_credentials(&self) -> Result<OAuthCredentials, ConfigError> {
        if let Some(path) = self.credentials_file() {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                ConfigError::Message(format!("failed to read credentials file {}: {}", path, e))
            })?;
            return OAuthCredentials::parse(&raw);
        }

        match self.credentials_contents() {
            Some(raw) => OAuthCredentials::parse(raw),
            None => Err(ConfigError::Message(
                "missing oauth2 google credentials".to_string(),
            )),
        }
    }

    /// Where the provider sends the browser back to.
    pub fn redirect_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CALLBACK_PATH)
    }

    /// Session cookies are marked `Secure` when served over https.
    pub fn cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

/// OAuth client credentials as stored in the credentials JSON.
#[derive(Clone, Deserialize)]
pub struct OAuthCredentials {
    #[serde(alias = "client_id")]
    pub clientid: String,
    #[serde(alias = "client_secret")]
    pub secret: String,
}

impl OAuthCredentials {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let creds: OAuthCredentials = serde_json::from_str(raw)
            .map_err(|e| ConfigError::Message(format!("invalid oauth2 credentials: {}", e)))?;
        if creds.clientid.is_empty() || creds.secret.is_empty() {
            return Err(ConfigError::Message(
                "oauth2 credentials need a clientid and a secret".to_string(),
            ));
        }
        Ok(creds)
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("clientid", &self.clientid)
            .field("secret", &"<redacted>")
            .finish()
    }
}
