//! Configuration management for bridge services

use crate::error::{BridgeError, Result};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_bind: SocketAddr,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "replicator".to_string()),
            http_bind: env::var("HTTP_BIND")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
                .parse()
                .map_err(|e| BridgeError::Config(format!("Invalid HTTP_BIND: {}", e)))?,
        })
    }
}

/// Read a positive millisecond duration from the environment
pub fn millis_from_env(key: &str, default: u64) -> Result<std::time::Duration> {
    let millis: u64 = match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BridgeError::Config(format!("Invalid {}: {}", key, e)))?,
        Err(_) => default,
    };
    if millis == 0 {
        return Err(BridgeError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(std::time::Duration::from_millis(millis))
}
