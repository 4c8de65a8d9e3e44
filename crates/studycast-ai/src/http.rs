//! Shared HTTP plumbing for provider clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{AiError, AiResult};

/// Build a client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> AiResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .map_err(AiError::Network)
}

/// Classify a transport error.
pub fn send_error(provider: &str, err: reqwest::Error, timeout: Duration) -> AiError {
    if err.is_timeout() {
        AiError::Timeout(timeout.as_secs())
    } else if err.is_connect() || err.is_request() {
        AiError::unavailable(format!("{} unreachable: {}", provider, err))
    } else {
        AiError::Network(err)
    }
}

/// Pass successful responses through and classify failures.
///
/// 429 is a rate limit, 408 and 5xx mean the service is unavailable, other
/// statuses are permanent request failures.
pub async fn check_status(provider: &str, response: Response) -> AiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return Err(AiError::RateLimited { retry_after_secs });
    }

    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(500).collect();
    let message = format!("{} returned {}: {}", provider, status, body);

    if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        Err(AiError::unavailable(message))
    } else {
        Err(AiError::request_failed(message))
    }
}
