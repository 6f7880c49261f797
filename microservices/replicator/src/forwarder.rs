//! Write Forwarder
//!
//! Pushes each result group of a remote read to the sink as its own write
//! request. Groups are never merged, and a failed group does not stop the
//! groups after it.

use std::time::Duration;

use bridge_core::{BridgeError, Result};
use bridge_proto::headers::{REMOTE_WRITE_VERSION, REMOTE_WRITE_VERSION_HEADER};
use bridge_proto::{ReadResponse, WriteRequest};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::{ensure_success, protobuf_post, send_error};

/// Outcome of forwarding one read result
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForwardReport {
    pub groups: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub series: usize,
    pub samples: usize,
    /// Failed group index and cause
    #[serde(skip)]
    pub errors: Vec<(usize, BridgeError)>,
}

impl ForwardReport {
    pub fn is_success(&self) -> bool {
        self.batches_failed == 0
    }

    pub fn first_error(&self) -> Option<&BridgeError> {
        self.errors.first().map(|(_, e)| e)
    }
}

pub struct WriteForwarder {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl WriteForwarder {
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

    /// Send one write per result group, in result order
    pub async fn forward(&self, result: ReadResponse) -> ForwardReport {
        let mut report = ForwardReport {
            groups: result.results.len(),
            ..Default::default()
        };

        for (index, group) in result.results.into_iter().enumerate() {
            let batch = WriteRequest::from(group);
            let series = batch.timeseries.len();
            let samples = batch.sample_count();

            match self.write(&batch).await {
                Ok(()) => {
                    report.batches_sent += 1;
                    report.series += series;
                    report.samples += samples;
                    debug!(group = index, series, samples, "Write batch accepted");
                }
                Err(e) => {
                    report.batches_failed += 1;
                    warn!(
                        group = index,
                        series,
                        error = %e,
                        code = e.error_code(),
                        "Write batch failed"
                    );
                    report.errors.push((index, e));
                }
            }
        }

        report
    }

    /// Submit a single batch to the sink
    pub async fn write(&self, batch: &WriteRequest) -> Result<()> {
        let body = bridge_proto::encode(batch)
            .map_err(|e| BridgeError::Internal(format!("failed to encode write request: {}", e)))?;

        let response = protobuf_post(&self.client, &self.url, self.timeout, body)
            .header(REMOTE_WRITE_VERSION_HEADER, REMOTE_WRITE_VERSION)
            .send()
            .await
            .map_err(|e| send_error("remote write", e))?;

        ensure_success("remote write", response).await?;
        Ok(())
    }
}
