#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::fixtures::{alice_and_bob, test_config, test_state_with};
use serde_json::Value;
use timeslot::app_config::AppConfig;
use timeslot::build_app;

fn limited_config() -> AppConfig {
    AppConfig {
        rate_limit_max_requests: 3,
        ..test_config()
    }
}

#[actix_rt::test]
async fn test_ip_budget_exhausted() {
    let ts = test_state_with(&limited_config(), alice_and_bob());
    let app = test::init_service(build_app(ts.state.clone())).await;

    for i in 0..3 {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/health")
                .insert_header(("x-forwarded-for", "203.0.113.9"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "request {} should pass", i + 1);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/health")
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().get(header::RETRY_AFTER).is_some());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Too many requests. Try again later.");

    // Another address has its own budget
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/health")
            .insert_header(("x-forwarded-for", "198.51.100.4"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_bound_account_counted_separately() {
    let ts = test_state_with(&limited_config(), alice_and_bob());
    let app = test::init_service(build_app(ts.state.clone())).await;

    // Login and callback are counted under the (unknown) client address.
    let alice = login!(app, "alice-code");

    for _ in 0..3 {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/me")
                .cookie(alice.clone())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(alice.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // One anonymous request is left for the address
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
