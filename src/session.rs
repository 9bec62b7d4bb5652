//! Cookie session setup and the keys stored in it.

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Key, SameSite};

pub const COOKIE_NAME: &str = "timeslot_session";

/// CSRF state of a pending login.
pub const STATE_KEY: &str = "state";
/// Relative path to return to after login.
pub const REDIRECT_KEY: &str = "redirect";
/// Identity returned by the provider.
pub const IDENTITY_KEY: &str = "oauth_identity";
/// Account the identity is bound to.
pub const ACCOUNT_KEY: &str = "account_id";

/// Derive the 64 byte cookie signing key from the configured secret.
///
/// `Key::from` needs at least 64 bytes, so the secret is stretched with the
/// BLAKE3 extendable output instead of being used directly.
pub fn derive_key(secret: &str) -> Key {
    let mut material = [0u8; 64];
    let mut hasher = blake3::Hasher::new_derive_key("timeslot session cookie key");
    hasher.update(secret.as_bytes());
    hasher.finalize_xof().fill(&mut material);
    Key::from(&material)
}

pub fn middleware(key: Key, secure: bool, ttl_days: i64) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(COOKIE_NAME.to_owned())
        .cookie_content_security(CookieContentSecurity::Signed)
        .cookie_same_site(SameSite::Lax)
        .cookie_http_only(true)
        .cookie_secure(secure)
        .session_lifecycle(
            PersistentSession::default().session_ttl(CookieDuration::days(ttl_days)),
        )
        .build()
}
