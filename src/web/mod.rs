pub mod auth;
pub mod health;
pub mod polls;
pub mod votes;

use crate::error::{ApiError, MSG_INVALID_PAYLOAD, MSG_INVALID_POLL_ID};
use crate::ident::ID_LENGTH;
use actix_web::web;
use serde::Serialize;

/// Success envelope for API responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body parse failures answer 400 with a fixed message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("Rejected JSON body on {}: {}", req.path(), err);
        ApiError::Validation(MSG_INVALID_PAYLOAD.to_string()).into()
    })
}

/// Poll ids are short alphanumeric tokens.
pub(crate) fn parse_poll_id(raw: &str) -> Result<&str, ApiError> {
    if raw.is_empty() || raw.len() > ID_LENGTH || !raw.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(ApiError::Validation(MSG_INVALID_POLL_ID.to_string()));
    }
    Ok(raw)
}

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    conf.app_data(json_config());

    auth::configure(conf);
    health::configure(conf);
    polls::configure(conf);
    votes::configure(conf);
}
