//! Remote read client

use std::time::Duration;

use bridge_core::{BridgeError, Result};
use bridge_proto::headers::{REMOTE_READ_VERSION, REMOTE_READ_VERSION_HEADER};
use bridge_proto::{Query, ReadRequest, ReadResponse};
use reqwest::{Client, Url};
use tracing::debug;

use crate::client::{ensure_success, protobuf_post, send_error};
use crate::selector::Selector;
use crate::window::Window;

/// One cycle's query: the compiled selector over a window
#[derive(Debug, Clone, Copy)]
pub struct ReadQuery<'a> {
    pub window: Window,
    pub selector: &'a Selector,
}

impl<'a> ReadQuery<'a> {
    pub fn new(window: Window, selector: &'a Selector) -> Self {
        Self { window, selector }
    }

    pub fn to_request(&self) -> ReadRequest {
        ReadRequest::samples(vec![Query {
            start_timestamp_ms: self.window.start_ms,
            end_timestamp_ms: self.window.end_ms,
            matchers: self.selector.matchers().to_vec(),
        }])
    }
}

pub struct RemoteReadClient {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl RemoteReadClient {
    pub fn new(client: Client, url: Url, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Execute a windowed query against the source
    pub async fn read(&self, query: &ReadQuery<'_>) -> Result<ReadResponse> {
        let body = bridge_proto::encode(&query.to_request())
            .map_err(|e| BridgeError::Internal(format!("failed to encode read request: {}", e)))?;

        debug!(url = %self.url, window = %query.window, "Sending remote read");

        let response = protobuf_post(&self.client, &self.url, self.timeout, body)
            .header(REMOTE_READ_VERSION_HEADER, REMOTE_READ_VERSION)
            .send()
            .await
            .map_err(|e| send_error("remote read", e))?;

        let response = ensure_success("remote read", response).await?;

        let compressed = response
            .bytes()
            .await
            .map_err(|e| send_error("remote read", e))?;

        let result: ReadResponse = bridge_proto::decode(&compressed)
            .map_err(|e| BridgeError::Protocol(format!("invalid remote read response: {}", e)))?;

        debug!(
            results = result.results.len(),
            series = result.series_count(),
            bytes = compressed.len(),
            "Remote read complete"
        );

        Ok(result)
    }
}
