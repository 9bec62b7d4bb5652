use crate::error::ApiError;
use crate::middleware::AuthCtx;
use crate::state::AppState;
use crate::web::DataResponse;
use actix_session::Session;
use actix_web::http::header;
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(view_callback)
        .service(view_logout)
        .service(view_me);
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub from: Option<String>,
}

#[derive(Serialize)]
struct MeResponse<'a> {
    id: i64,
    email: &'a str,
    name: &'a str,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[get("/login")]
pub async fn view_login(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<LoginQuery>,
) -> Result<HttpResponse, ApiError> {
    let url = state
        .oauth
        .initiate_login(&session, query.from.as_deref())?;
    Ok(redirect(&url))
}

/// Provider callback. The `AuthCtx` extractor completes the login.
#[get("/auth/google/callback")]
pub async fn view_callback(
    auth: AuthCtx,
    state: web::Data<AppState>,
    session: Session,
) -> HttpResponse {
    log::info!("Account {} logged in", auth.account_id);
    redirect(&state.oauth.take_redirect(&session))
}

#[get("/logout")]
pub async fn view_logout(state: web::Data<AppState>, session: Session) -> HttpResponse {
    state.oauth.logout(&session);
    redirect("/")
}

#[get("/api/v1/me")]
pub async fn view_me(auth: AuthCtx) -> HttpResponse {
    HttpResponse::Ok().json(DataResponse::new(MeResponse {
        id: auth.account_id,
        email: &auth.identity.email,
        name: &auth.identity.name,
    }))
}
