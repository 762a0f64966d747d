//! Report destinations.
//!
//! A run hands its [`BatchSummary`] to an optional [`DocumentSink`] (the
//! full report) and sends a short message through an optional
//! [`NotificationSink`]. Both are fire-and-forget from the pipeline's point
//! of view: failures are logged and reported through the notifier, never
//! propagated.

use crate::error::{FetchError, SinkError};
use crate::models::BatchSummary;
use reqwest::Response;

pub mod notion;
pub mod telegram;

pub use notion::NotionPublisher;
pub use telegram::TelegramNotifier;

/// Stores a rendered report and returns a link to it.
pub trait DocumentSink {
    async fn publish(&self, summary: &BatchSummary) -> Result<String, SinkError>;
}

/// Delivers a short HTML message.
pub trait NotificationSink {
    async fn notify(&self, html: &str) -> Result<(), SinkError>;
}

/// Transport failure against `service`, with the request URL removed so
/// credentials embedded in it never reach the logs.
pub(crate) fn transport_error(service: &'static str, err: reqwest::Error) -> SinkError {
    SinkError::Fetch(FetchError::from_reqwest(service, err.without_url()))
}

/// Turn a non-2xx response into [`SinkError::Rejected`] carrying the body.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Rejected {
        service,
        message: format!("HTTP {}: {}", status.as_u16(), crate::utils::truncate_for_log(&body, 300)),
    })
}
