//! Blocking HTTP clients for the external collaborators.
//!
//! Each client is constructed before the async runtime starts and is only
//! ever called from a worker thread via `pixel_core::offload`.

pub mod azure;
pub mod gemini;
pub mod reddit;

use pixel_core::error::ServiceError;
use reqwest::blocking::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("pixel-bot/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client(user_agent: Option<&str>) -> Result<Client, ServiceError> {
    Client::builder()
        .user_agent(user_agent.unwrap_or(USER_AGENT))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(transport_error)
}

pub(crate) fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Canceled(format!("timed out: {e}"))
    } else {
        ServiceError::Http(e.to_string())
    }
}

/// Passes successful responses through; anything else becomes a
/// [`ServiceError::Status`] carrying the body text.
pub(crate) fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn decode_error(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Decode(e.to_string())
}
