use crate::error::ApiError;
use crate::oauth::Identity;
use crate::state::AppState;
use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{web, Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::Deserialize;

/// Authenticated caller of a route.
///
/// Extracting it completes a pending OAuth login when the request carries
/// `state` and `code`, and binds the identity to an account on first use.
#[derive(Clone, Debug)]
pub struct AuthCtx {
    pub identity: Identity,
    pub account_id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    state: String,
    #[serde(default)]
    code: String,
}

/// This implementation is what provides `auth: AuthCtx` in the parameters of route functions.
impl FromRequest for AuthCtx {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| ApiError::Internal("application state is not loaded".into()))?;
            let session = req.get_session();
            let query = web::Query::<CallbackQuery>::from_query(req.query_string())
                .map(web::Query::into_inner)
                .unwrap_or_default();

            let identity = state
                .oauth
                .authenticate(&session, &query.state, &query.code)
                .await?;
            let account_id = state.binder.bind(&session, Some(&identity)).await?;

            Ok(AuthCtx {
                identity,
                account_id,
            })
        })
    }
}
