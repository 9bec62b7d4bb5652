//! Poll endpoints

use super::{parse_poll_id, DataResponse};
use crate::error::{ApiError, MSG_POLL_NOT_FOUND};
use crate::middleware::AuthCtx;
use crate::models::{Poll, PollAccountAvailability, PollBase};
use crate::state::AppState;
use actix_web::{delete, get, post, web, HttpResponse};
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_polls)
        .service(create_poll)
        .service(view_poll)
        .service(delete_poll);
}

#[derive(Serialize)]
struct PollWithAvailabilities {
    poll: Poll,
    availabilities: Vec<PollAccountAvailability>,
}

#[get("/api/v1/poll")]
pub async fn list_polls(
    auth: AuthCtx,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let polls = state.polls.list(auth.account_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(polls)))
}

#[post("/api/v1/poll")]
pub async fn create_poll(
    auth: AuthCtx,
    state: web::Data<AppState>,
    body: web::Json<PollBase>,
) -> Result<HttpResponse, ApiError> {
    let poll = state
        .polls
        .create(auth.account_id, body.into_inner())
        .await?;
    log::info!("Account {} created poll {}", auth.account_id, poll.id);
    Ok(HttpResponse::Ok().json(DataResponse::new(poll)))
}

/// Public: anyone with the link can see a poll and its answers.
#[get("/api/v1/poll/{id}")]
pub async fn view_poll(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let poll_id = parse_poll_id(&path)?;

    let poll = state
        .polls
        .get(poll_id)
        .await?
        .ok_or(ApiError::NotFound(MSG_POLL_NOT_FOUND))?;
    let availabilities = state.votes.list_for_poll(poll_id).await?;

    Ok(HttpResponse::Ok().json(DataResponse::new(PollWithAvailabilities {
        poll,
        availabilities,
    })))
}

#[delete("/api/v1/poll/{id}")]
pub async fn delete_poll(
    auth: AuthCtx,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let poll_id = parse_poll_id(&path)?;

    match state.polls.delete(auth.account_id, poll_id).await? {
        Some(poll) => {
            log::info!("Account {} deleted poll {}", auth.account_id, poll.id);
            Ok(HttpResponse::Ok().json(DataResponse::new(poll)))
        }
        None => Err(ApiError::NotFound(MSG_POLL_NOT_FOUND)),
    }
}
