use crate::state::AppState;
use actix_web::{get, web, HttpResponse};
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_health);
}

#[get("/health")]
pub async fn view_health(state: web::Data<AppState>) -> HttpResponse {
    match state.repo.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "server": "healthy", "db": "healthy" })),
        Err(e) => {
            log::error!("Health check failed to reach the database: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "server": "healthy", "db": "unhealthy" }))
        }
    }
}
