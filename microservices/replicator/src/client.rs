//! Shared HTTP plumbing for the remote read and write endpoints

use std::time::Duration;

use bridge_core::{BridgeError, Result};
use bridge_proto::headers::{CONTENT_ENCODING_SNAPPY, CONTENT_TYPE_PROTOBUF};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, Url};

pub const USER_AGENT: &str = concat!("replicator/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error response body kept in an error message
const MAX_ERROR_BODY: usize = 256;

pub fn build_client(connect_timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| BridgeError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// POST builder carrying a snappy-compressed protobuf body
pub fn protobuf_post(client: &Client, url: &Url, timeout: Duration, body: Vec<u8>) -> RequestBuilder {
    client
        .post(url.clone())
        .timeout(timeout)
        .header(CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)
        .header(CONTENT_ENCODING, CONTENT_ENCODING_SNAPPY)
        .body(body)
}

pub fn send_error(endpoint: &str, err: reqwest::Error) -> BridgeError {
    if err.is_timeout() {
        BridgeError::Timeout(format!("{} request timed out: {}", endpoint, err))
    } else {
        BridgeError::Transport(format!("{} request failed: {}", endpoint, err))
    }
}

/// Turn a non-2xx response into a protocol error
pub async fn ensure_success(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    Err(BridgeError::Protocol(format!(
        "{} returned {}: {}",
        endpoint, status, snippet
    )))
}
