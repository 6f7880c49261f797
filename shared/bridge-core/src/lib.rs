//! Bridge Core - Shared service infrastructure for the replication bridge
//!
//! This crate provides:
//! - Standard service trait and runtime lifecycle
//! - Error taxonomy shared by every bridge component
//! - Base configuration management
//! - Clock abstraction used to cut replication windows

pub mod clock;
pub mod config;
pub mod error;
pub mod service;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::ServiceConfig;
pub use error::{BridgeError, Result};
pub use service::{BridgeService, DependencyStatus, HealthStatus, ReadinessStatus, ServiceRuntime};
