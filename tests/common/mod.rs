#![allow(dead_code)]

pub mod database;
pub mod fixtures;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use timeslot::session::COOKIE_NAME;

/// The session cookie set by a response, if the session changed.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == COOKIE_NAME)
        .map(|c| c.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The `state` query parameter of the provider redirect.
pub fn state_from_location<B>(resp: &ServiceResponse<B>) -> String {
    let url = url::Url::parse(&location(resp)).expect("login redirects to an absolute URL");
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

/// Runs `/login` then the provider callback with `code` and returns the
/// session cookie of the logged in browser.
macro_rules! login {
    ($app:expr, $code:expr) => {{
        let resp = actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::get().uri("/login").to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        let state = common::state_from_location(&resp);
        let cookie = common::session_cookie(&resp).expect("login sets a session cookie");

        let resp = actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::get()
                .uri(&format!("/auth/google/callback?state={}&code={}", state, $code))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        common::session_cookie(&resp).expect("callback updates the session cookie")
    }};
}
