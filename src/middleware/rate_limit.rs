//! Per-requester request budget, applied before authentication.

use crate::error::ApiError;
use crate::ip::extract_client_ip;
use crate::rate_limit::rate_limit_key;
use crate::session::ACCOUNT_KEY;
use crate::state::AppState;
use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};

/// Counts every request under the session's account id, or the client
/// address when the session is not bound, and answers 429 over budget.
///
/// Must be wrapped inside the session middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct Throttle;

impl<S, B> Transform<S, ServiceRequest> for Throttle
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ThrottleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ThrottleMiddleware { service }))
    }
}

pub struct ThrottleMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ThrottleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = match req.app_data::<Data<AppState>>() {
            Some(state) => {
                let account_id = req.get_session().get::<i64>(ACCOUNT_KEY).ok().flatten();
                let ip = extract_client_ip(req.request()).unwrap_or_else(|| "unknown".to_owned());
                // One key per request, used for both the check and the record.
                let key = rate_limit_key(account_id, &ip);
                state
                    .limiter
                    .check(&state.rate_limit, &key)
                    .map_err(|e| (key, e))
            }
            None => {
                log::error!("Rate limiter skipped: application state is not loaded");
                Ok(())
            }
        };

        match verdict {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err((key, e)) => {
                log::warn!(
                    "Rate limit exceeded for {} (retry after {}s)",
                    key,
                    e.retry_after_seconds
                );
                let response = ApiError::RateLimited {
                    retry_after_seconds: e.retry_after_seconds,
                }
                .error_response();
                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            }
        }
    }
}
