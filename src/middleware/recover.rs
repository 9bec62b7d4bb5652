//! Turns a panicking handler into a generic 500 response.

use crate::error::ApiError;
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures::future::{ready, FutureExt, LocalBoxFuture, Ready};
use std::any::Any;
use std::panic::AssertUnwindSafe;

#[derive(Clone, Copy, Debug, Default)]
pub struct CatchPanic;

impl<S, B> Transform<S, ServiceRequest> for CatchPanic
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CatchPanicMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CatchPanicMiddleware { service }))
    }
}

pub struct CatchPanicMiddleware<S> {
    service: S,
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

impl<S, B> Service<ServiceRequest> for CatchPanicMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Routing needs sole ownership of the request, so no handle to it
        // may be held while the inner service runs.
        let method = req.method().to_string();
        let path = req.path().to_owned();
        let fut = AssertUnwindSafe(self.service.call(req)).catch_unwind();

        Box::pin(async move {
            match fut.await {
                Ok(res) => res,
                Err(panic) => {
                    log::error!(
                        "Recovered from panic in {} {}: {}",
                        method,
                        path,
                        panic_message(panic.as_ref())
                    );
                    Err(ApiError::Internal(format!("panic in {} {}", method, path)).into())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MSG_UNEXPECTED;
    use actix_web::body::to_bytes;
    use actix_web::test::{call_service, init_service, try_call_service, TestRequest};
    use actix_web::{web, App, HttpResponse};

    async fn boom() -> HttpResponse {
        panic!("handler exploded");
    }

    async fn fine(path: web::Path<String>) -> HttpResponse {
        HttpResponse::Ok().body(path.into_inner())
    }

    #[actix_rt::test]
    async fn test_panic_becomes_500() {
        let app = init_service(
            App::new()
                .wrap(CatchPanic)
                .route("/boom", web::get().to(boom)),
        )
        .await;

        let err = try_call_service(&app, TestRequest::get().uri("/boom").to_request())
            .await
            .err()
            .unwrap();
        let resp = err.error_response();
        assert_eq!(resp.status(), 500);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], MSG_UNEXPECTED);
    }

    #[actix_rt::test]
    async fn test_routed_request_passes_through() {
        let app = init_service(
            App::new()
                .wrap(CatchPanic)
                .route("/echo/{word}", web::get().to(fine)),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/echo/hello").to_request()).await;
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
