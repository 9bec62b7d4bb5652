//! Availability voting endpoints

use super::{parse_poll_id, DataResponse};
use crate::error::{ApiError, MSG_VOTE_NOT_FOUND};
use crate::middleware::AuthCtx;
use crate::models::AvailabilitySubmission;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(submit_vote).service(view_vote);
}

/// Replace the caller's availability on a poll.
#[post("/api/v1/poll/{id}/vote")]
pub async fn submit_vote(
    auth: AuthCtx,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Vec<AvailabilitySubmission>>,
) -> Result<HttpResponse, ApiError> {
    let poll_id = parse_poll_id(&path)?;

    let vote = state
        .votes
        .submit(auth.account_id, poll_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(vote)))
}

#[get("/api/v1/poll/{id}/vote")]
pub async fn view_vote(
    auth: AuthCtx,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let poll_id = parse_poll_id(&path)?;

    state
        .votes
        .get(auth.account_id, poll_id)
        .await?
        .map(|vote| HttpResponse::Ok().json(DataResponse::new(vote)))
        .ok_or(ApiError::NotFound(MSG_VOTE_NOT_FOUND))
}
