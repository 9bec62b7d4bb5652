//! Shared application state handed to every worker.

use crate::accounts::{AccountResolver, SessionBinder};
use crate::app_config::AppConfig;
use crate::ident::IdGenerator;
use crate::oauth::{IdentityProvider, OAuthSessionFlow};
use crate::polls::PollStore;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::session::derive_key;
use crate::store::Repository;
use crate::votes::VoteStore;
use actix_web::cookie::Key;
use std::sync::Arc;

/// Cookie session settings.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub secure: bool,
    pub ttl_days: i64,
}

/// Cheap to clone; every field is reference counted or `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub binder: SessionBinder,
    pub polls: PollStore,
    pub votes: VoteStore,
    pub oauth: OAuthSessionFlow,
    pub limiter: Arc<RateLimiter>,
    pub rate_limit: RateLimitPolicy,
    pub session: SessionSettings,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        repo: Arc<dyn Repository>,
        provider: Arc<dyn IdentityProvider>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        let accounts = AccountResolver::new(repo.clone());

        Self {
            binder: SessionBinder::new(accounts),
            polls: PollStore::new(repo.clone(), ids.clone(), config.max_polls_per_account),
            votes: VoteStore::new(repo.clone()),
            oauth: OAuthSessionFlow::new(provider, ids),
            limiter: Arc::new(RateLimiter::new()),
            rate_limit: RateLimitPolicy {
                max_requests: config.rate_limit_max_requests,
                window: config.rate_limit_window(),
            },
            session: SessionSettings {
                key: derive_key(&config.cookie_secret),
                secure: config.cookie_secure(),
                ttl_days: config.session_ttl_days,
            },
            repo,
        }
    }
}
