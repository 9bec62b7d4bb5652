pub mod accounts;
pub mod app_config;
pub mod error;
pub mod ident;
pub mod ip;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod orm;
pub mod polls;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod store;
pub mod votes;
pub mod web;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::App;

pub use state::AppState;

/// Builds the application with its middleware stack and routes.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let sessions = session::middleware(
        state.session.key.clone(),
        state.session.secure,
        state.session.ttl_days,
    );

    // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
    // The throttle reads the session, so it sits inside the session middleware.
    App::new()
        .app_data(Data::new(state))
        .wrap(middleware::Throttle)
        .wrap(sessions)
        .wrap(
            DefaultHeaders::new()
                .add((header::X_FRAME_OPTIONS, "DENY"))
                .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
        )
        .wrap(middleware::CatchPanic)
        .wrap(Logger::new("%a %r %s %Dms"))
        .configure(web::configure)
}
