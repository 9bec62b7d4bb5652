//! Test fixtures: a scripted identity provider and application state
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use timeslot::app_config::AppConfig;
use timeslot::ident::IdGenerator;
use timeslot::oauth::{AccessToken, Identity, IdentityProvider, ProviderError};
use timeslot::store::MemoryRepository;
use timeslot::AppState;

/// Authorization code whose token exchange succeeds but whose identity lookup fails.
pub const BROKEN_USERINFO_CODE: &str = "broken-userinfo";

/// Identity provider answering from a fixed code -> identity table.
#[derive(Default)]
pub struct FakeProvider {
    identities: HashMap<String, Identity>,
    exchanges: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, code: &str, email: &str, name: &str) -> Self {
        self.identities.insert(
            code.to_string(),
            Identity {
                email: email.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    /// Number of token exchanges attempted so far.
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError> {
        Ok(format!("https://provider.test/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == BROKEN_USERINFO_CODE || self.identities.contains_key(code) {
            Ok(AccessToken(code.to_string()))
        } else {
            Err(ProviderError::Status(400, "invalid_grant".to_string()))
        }
    }

    async fn fetch_identity(&self, token: &AccessToken) -> Result<Identity, ProviderError> {
        self.identities
            .get(&token.0)
            .cloned()
            .ok_or_else(|| ProviderError::Network("userinfo timed out".to_string()))
    }
}

/// Configuration with every required value filled in.
pub fn test_config() -> AppConfig {
    AppConfig {
        cookie_secret: "integration-test-secret".to_string(),
        database_url: "postgres://unused".to_string(),
        base_url: "http://localhost:8080".to_string(),
        port: 8080,
        oauth2_google_credentials_contents: Some(
            r#"{"clientid":"test","secret":"test"}"#.to_string(),
        ),
        ..AppConfig::default()
    }
}

pub fn alice_and_bob() -> FakeProvider {
    FakeProvider::new()
        .with_user("alice-code", "alice@example.com", "Alice")
        .with_user("bob-code", "bob@example.com", "Bob")
}

pub struct TestState {
    pub state: AppState,
    pub repo: Arc<MemoryRepository>,
    pub provider: Arc<FakeProvider>,
}

pub fn test_state_with(config: &AppConfig, provider: FakeProvider) -> TestState {
    let repo = Arc::new(MemoryRepository::new());
    let provider = Arc::new(provider);
    let state = AppState::new(
        config,
        repo.clone(),
        provider.clone(),
        Arc::new(IdGenerator::seeded(1234)),
    );
    TestState {
        state,
        repo,
        provider,
    }
}

pub fn test_state() -> TestState {
    test_state_with(&test_config(), alice_and_bob())
}
