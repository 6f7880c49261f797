//! Service infrastructure for bridge services

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use crate::error::{BridgeError, Result};

/// Health status for liveness probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub service_id: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Readiness status for readiness probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessStatus {
    pub ready: bool,
    pub dependencies: Vec<DependencyStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub latency_ms: Option<u64>,
}

/// Standard trait all bridge services implement
#[async_trait]
pub trait BridgeService: Send + Sync + 'static {
    /// Service identifier (e.g., "replicator")
    fn service_id(&self) -> &'static str;

    /// Service version
    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Health check - is the service alive?
    async fn health(&self) -> HealthStatus;

    /// Readiness check - did the last unit of work succeed?
    async fn ready(&self) -> ReadinessStatus;

    /// Graceful shutdown
    async fn shutdown(&self) -> Result<()>;

    /// Start the service (work loops, HTTP servers, etc.)
    async fn start(&self) -> Result<()>;
}

/// Standard service runtime bootstrap
pub struct ServiceRuntime {
    start_time: std::time::Instant,
}

impl ServiceRuntime {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }

    /// Run a service until it exits or a shutdown signal arrives
    pub async fn run<S: BridgeService>(service: Arc<S>) -> Result<()> {
        let runtime = Self::new();

        info!(
            service_id = service.service_id(),
            version = service.version(),
            "Starting service"
        );

        let service_clone = service.clone();
        let mut service_handle = tokio::spawn(async move { service_clone.start().await });

        let exited: Option<Result<()>> = tokio::select! {
            joined = &mut service_handle => Some(match joined {
                Ok(Ok(())) => Err(BridgeError::Internal(
                    "service exited without a shutdown signal".to_string(),
                )),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(BridgeError::Internal(format!("service task failed: {}", e))),
            }),
            _ = Self::wait_for_shutdown() => None,
        };

        match &exited {
            Some(Err(e)) => error!(error = %e, code = e.error_code(), "Service stopped unexpectedly"),
            _ => info!("Shutdown signal received, gracefully stopping..."),
        }

        if let Err(e) = service.shutdown().await {
            warn!("Error during shutdown: {}", e);
        }

        service_handle.abort();

        info!(
            uptime_seconds = runtime.start_time.elapsed().as_secs(),
            "Service stopped"
        );

        exited.unwrap_or(Ok(()))
    }

    async fn wait_for_shutdown() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }
}

impl Default for ServiceRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ShortLived {
        stopped: AtomicBool,
    }

    #[async_trait]
    impl BridgeService for ShortLived {
        fn service_id(&self) -> &'static str {
            "short-lived"
        }

        async fn health(&self) -> HealthStatus {
            HealthStatus {
                healthy: true,
                service_id: self.service_id().to_string(),
                version: self.version().to_string(),
                uptime_seconds: 0,
            }
        }

        async fn ready(&self) -> ReadinessStatus {
            ReadinessStatus {
                ready: true,
                dependencies: vec![],
            }
        }

        async fn shutdown(&self) -> Result<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn start(&self) -> Result<()> {
            Err(BridgeError::Internal("boom".into()))
        }
    }

    #[tokio::test]
    async fn test_runtime_returns_service_error() {
        let service = Arc::new(ShortLived {
            stopped: AtomicBool::new(false),
        });

        let err = ServiceRuntime::run(service.clone()).await.unwrap_err();

        assert_eq!(err, BridgeError::Internal("boom".into()));
        assert!(service.stopped.load(Ordering::SeqCst));
    }
}
