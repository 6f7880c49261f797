//! Replicator Configuration

use std::time::Duration;

use bridge_core::config::millis_from_env;
use bridge_core::{BridgeError, Result, ServiceConfig};
use reqwest::Url;

pub const DEFAULT_SELECTOR: &str = r#"{__name__=~"process_cpu_seconds_total"}"#;
pub const DEFAULT_READ_URL: &str = "http://localhost:19090/api/v1/read";
pub const DEFAULT_WRITE_URL: &str = "http://localhost:29090/api/v1/write";
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ReplicatorConfig {
    pub service: ServiceConfig,
    /// Selector expression compiled once at startup
    pub selector: String,
    pub remote_read_url: Url,
    pub remote_write_url: Url,
    pub tick_interval: Duration,
    /// Deadline applied to every outbound read and write
    pub request_timeout: Duration,
}

impl ReplicatorConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            service: ServiceConfig::from_env()?,
            selector: std::env::var("BRIDGE_SELECTOR")
                .unwrap_or_else(|_| DEFAULT_SELECTOR.to_string()),
            remote_read_url: parse_endpoint(
                "REMOTE_READ_URL",
                &std::env::var("REMOTE_READ_URL").unwrap_or_else(|_| DEFAULT_READ_URL.to_string()),
            )?,
            remote_write_url: parse_endpoint(
                "REMOTE_WRITE_URL",
                &std::env::var("REMOTE_WRITE_URL")
                    .unwrap_or_else(|_| DEFAULT_WRITE_URL.to_string()),
            )?,
            tick_interval: millis_from_env("TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)?,
            request_timeout: millis_from_env("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
        })
    }
}

/// Parse an absolute http(s) endpoint URL
pub fn parse_endpoint(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BridgeError::Config(format!("Invalid {}: {}", key, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(BridgeError::Config(format!(
            "Invalid {}: unsupported scheme {:?}",
            key,
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(BridgeError::Config(format!("Invalid {}: missing host", key)));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_accepts_http_and_https() {
        let url = parse_endpoint("REMOTE_READ_URL", DEFAULT_READ_URL).unwrap();
        assert_eq!(url.port(), Some(19090));
        assert_eq!(url.path(), "/api/v1/read");

        assert!(parse_endpoint("REMOTE_WRITE_URL", "https://sink.example/api/v1/write").is_ok());
    }

    #[test]
    fn test_parse_endpoint_rejects_bad_urls() {
        for raw in ["localhost:19090/api/v1/read", "ftp://host/read", "not a url", ""] {
            let err = parse_endpoint("REMOTE_READ_URL", raw).unwrap_err();
            assert!(matches!(err, BridgeError::Config(_)), "{raw}: {err}");
        }
    }
}
