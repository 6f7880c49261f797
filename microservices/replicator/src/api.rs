//! Status HTTP surface

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use bridge_core::{DependencyStatus, HealthStatus, ReadinessStatus};
use serde_json::json;

use crate::metrics::ReplicatorMetrics;
use crate::scheduler::{CycleSummary, LastCycle};

#[derive(Clone)]
pub struct StatusState {
    pub service_id: String,
    pub version: &'static str,
    pub selector: String,
    pub read_url: String,
    pub write_url: String,
    pub tick_interval_ms: u64,
    pub metrics: ReplicatorMetrics,
    pub last_cycle: LastCycle,
    pub started: Instant,
}

impl StatusState {
    pub fn last_cycle(&self) -> Option<CycleSummary> {
        self.last_cycle.read().clone()
    }

    /// Ready until a cycle fails; recovers on the next successful cycle
    pub fn is_ready(&self) -> bool {
        self.last_cycle
            .read()
            .as_ref()
            .map_or(true, |summary| summary.succeeded)
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: self.service_id.clone(),
            version: self.version.to_string(),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }

    /// A failed write batch means the source answered
    pub fn readiness(&self) -> ReadinessStatus {
        let last = self.last_cycle();
        ReadinessStatus {
            ready: self.is_ready(),
            dependencies: vec![
                DependencyStatus {
                    name: "remote-read".to_string(),
                    available: last.as_ref().map_or(true, |c| c.succeeded || c.batches_failed > 0),
                    latency_ms: None,
                },
                DependencyStatus {
                    name: "remote-write".to_string(),
                    available: last.as_ref().map_or(true, |c| c.batches_failed == 0),
                    latency_ms: None,
                },
            ],
        }
    }
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/v1/status", get(status))
        .with_state(state)
}

async fn health(State(state): State<StatusState>) -> impl IntoResponse {
    Json(state.health())
}

async fn ready(State(state): State<StatusState>) -> impl IntoResponse {
    let readiness = state.readiness();
    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "ready": readiness.ready,
            "dependencies": readiness.dependencies,
            "last_error": state.last_cycle().and_then(|c| c.error),
        })),
    )
}

async fn status(State(state): State<StatusState>) -> impl IntoResponse {
    Json(json!({
        "selector": state.selector,
        "remote_read_url": state.read_url,
        "remote_write_url": state.write_url,
        "tick_interval_ms": state.tick_interval_ms,
        "metrics": state.metrics.snapshot(),
        "last_cycle": state.last_cycle(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Window;
    use chrono::Utc;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn state() -> StatusState {
        StatusState {
            service_id: "replicator".to_string(),
            version: "test",
            selector: r#"{__name__="up"}"#.to_string(),
            read_url: "http://source/api/v1/read".to_string(),
            write_url: "http://sink/api/v1/write".to_string(),
            tick_interval_ms: 3_000,
            metrics: ReplicatorMetrics::new(),
            last_cycle: Arc::new(RwLock::new(None)),
            started: Instant::now(),
        }
    }

    fn summary(succeeded: bool) -> CycleSummary {
        CycleSummary {
            window: Window::new(1_000, 4_000).unwrap(),
            succeeded,
            groups: 1,
            batches_sent: usize::from(succeeded),
            batches_failed: usize::from(!succeeded),
            series: 0,
            samples: 0,
            duration_ms: 5,
            error: (!succeeded).then(|| "Protocol error: remote write returned 500".to_string()),
            error_code: (!succeeded).then_some("PROTOCOL_ERROR"),
            completed_at: Utc::now(),
        }
    }

    async fn get_json(state: StatusState, path: &str) -> (StatusCode, serde_json::Value) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        let resp = reqwest::get(format!("http://{}{}", addr, path)).await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        let body: serde_json::Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
        (status, body)
    }

    #[test]
    fn test_ready_until_a_cycle_fails() {
        let state = state();
        assert!(state.is_ready());

        *state.last_cycle.write() = Some(summary(false));
        assert!(!state.is_ready());

        *state.last_cycle.write() = Some(summary(true));
        assert!(state.is_ready());
    }

    #[tokio::test]
    async fn test_ready_endpoint_reports_failure() {
        let state = state();
        *state.last_cycle.write() = Some(summary(false));

        let (status, body) = get_json(state, "/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert!(body["last_error"].as_str().unwrap().contains("500"));
        assert_eq!(body["dependencies"][0]["available"], true);
        assert_eq!(body["dependencies"][1]["available"], false);
    }

    #[tokio::test]
    async fn test_status_endpoint_includes_metrics_and_last_cycle() {
        let state = state();
        state.metrics.cycles_total.add(7);
        *state.last_cycle.write() = Some(summary(true));

        let (status, body) = get_json(state, "/api/v1/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selector"], r#"{__name__="up"}"#);
        assert_eq!(body["metrics"]["cycles_total"], 7);
        assert_eq!(body["last_cycle"]["window"]["start_ms"], 1_000);
        assert_eq!(body["last_cycle"]["succeeded"], true);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = get_json(state(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["service_id"], "replicator");
    }
}
