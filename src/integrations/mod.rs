//! Clients for the third-party HTTP APIs: DataJud, the WhatsApp Cloud API
//! and the Telegram Bot API.
//!
//! All of them use the blocking reqwest client. The API calls them from
//! inside `web::block`, the notifier from its worker thread.

use std::time::Duration;

use thiserror::Error;

use crate::services::ServiceError;

pub mod datajud;
pub mod telegram;
pub mod whatsapp;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("integration is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote api returned {status}: {body}")]
    Api { status: u16, body: String },
}

impl From<IntegrationError> for ServiceError {
    fn from(err: IntegrationError) -> Self {
        log::error!("Integration failure: {err}");
        ServiceError::Integration(err.to_string())
    }
}

/// Blocking HTTP client shared by the integrations.
pub fn http_client() -> Result<reqwest::blocking::Client, IntegrationError> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Turns a non-success response into [`IntegrationError::Api`].
fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(IntegrationError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
