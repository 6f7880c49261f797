//! Replicator
//!
//! Continuous metrics replication bridge:
//! - Compiles one label selector at startup
//! - Every tick, remote-reads the series matching it over the window since the last tick
//! - Remote-writes each returned series group to the sink
//! - Exposes health, readiness and replication status over HTTP

use std::future::IntoFuture;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Instant;

use bridge_core::{
    BridgeError, BridgeService, HealthStatus, ReadinessStatus, Result, ServiceRuntime,
    SystemClock,
};
use tokio::sync::Mutex;
use tracing::info;

mod api;
mod client;
mod config;
mod forwarder;
mod metrics;
mod reader;
mod scheduler;
mod selector;
mod window;


use api::StatusState;
pub use config::ReplicatorConfig;
use forwarder::WriteForwarder;
use reader::RemoteReadClient;
use scheduler::Scheduler;
use selector::Selector;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ReplicatorConfig::from_env()?;
    bridge_telemetry::init(&config.service.service_name)
        .map_err(|e| BridgeError::Config(e.to_string()))?;

    info!(service = %config.service.service_name, "Starting Replicator");

    let service = Arc::new(ReplicatorService::new(config)?);
    ServiceRuntime::run(service).await
}

/// Replicator service state
pub struct ReplicatorService {
    config: ReplicatorConfig,
    scheduler: Mutex<Scheduler>,
    status: StatusState,
    /// Bound at construction, handed to the status server on start
    listener: parking_lot::Mutex<Option<TcpListener>>,
}

impl ReplicatorService {
    /// Fails on an invalid selector or an unbindable HTTP_BIND, so
    /// scheduling never starts with either
    pub fn new(config: ReplicatorConfig) -> Result<Self> {
        let selector = Selector::compile(&config.selector)?;
        info!(
            selector = %selector,
            matchers = selector.len(),
            "Selector compiled"
        );

        let http_bind = config.service.http_bind;
        let listener = TcpListener::bind(http_bind)
            .and_then(|listener| listener.set_nonblocking(true).map(|()| listener))
            .map_err(|e| BridgeError::Config(format!("Cannot bind HTTP_BIND {}: {}", http_bind, e)))?;

        let client = client::build_client(config.request_timeout)?;
        let reader = RemoteReadClient::new(
            client.clone(),
            config.remote_read_url.clone(),
            config.request_timeout,
        );
        let forwarder = WriteForwarder::new(
            client,
            config.remote_write_url.clone(),
            config.request_timeout,
        );

        let scheduler = Scheduler::new(
            selector,
            reader,
            forwarder,
            Arc::new(SystemClock),
            config.tick_interval,
        );

        let status = StatusState {
            service_id: config.service.service_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            selector: config.selector.clone(),
            read_url: config.remote_read_url.to_string(),
            write_url: config.remote_write_url.to_string(),
            tick_interval_ms: config.tick_interval.as_millis() as u64,
            metrics: scheduler.metrics(),
            last_cycle: scheduler.last_cycle(),
            started: Instant::now(),
        };

        Ok(Self {
            config,
            scheduler: Mutex::new(scheduler),
            status,
            listener: parking_lot::Mutex::new(Some(listener)),
        })
    }
}

#[async_trait::async_trait]
impl BridgeService for ReplicatorService {
    fn service_id(&self) -> &'static str {
        "replicator"
    }

    async fn health(&self) -> HealthStatus {
        self.status.health()
    }

    async fn ready(&self) -> ReadinessStatus {
        self.status.readiness()
    }

    async fn shutdown(&self) -> Result<()> {
        info!(
            cursor_ms = self.status.metrics.cursor_ms.get(),
            cycles = self.status.metrics.cycles_total.get(),
            "Shutting down Replicator; the interval after the cursor will not be replicated"
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        info!(
            http = %self.config.service.http_bind,
            read_url = %self.config.remote_read_url,
            write_url = %self.config.remote_write_url,
            tick_interval_ms = self.config.tick_interval.as_millis() as u64,
            request_timeout_ms = self.config.request_timeout.as_millis() as u64,
            "Starting Replicator"
        );

        let listener = self
            .listener
            .lock()
            .take()
            .ok_or_else(|| BridgeError::Internal("service already started".to_string()))?;
        let listener = tokio::net::TcpListener::from_std(listener)?;
        let app = api::router(self.status.clone());

        let mut scheduler = self.scheduler.lock().await;

        tokio::select! {
            served = axum::serve(listener, app).into_future() => {
                served.map_err(|e| BridgeError::Internal(format!("status server failed: {}", e)))?;
                Err(BridgeError::Internal("status server stopped".to_string()))
            }
            _ = scheduler.run() => {
                Err(BridgeError::Internal("replication scheduler stopped".to_string()))
            }
        }
    }
}
