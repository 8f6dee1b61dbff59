//! Kubernetes client for kubelist
//!
//! This crate resolves cluster configuration, owns the API session and turns
//! raw deployments into display records. Failures are classified into
//! user-facing errors before they leave the crate.

mod classify;
mod client;
mod context;
mod error;
mod logging;
mod resolver;
pub mod session;
mod transform;

pub use classify::{UserFacingError, classify};
pub use client::{CONNECTION_TEST_TIMEOUT, Client, ConnectionReport, VERSION_LOOKUP_TIMEOUT};
pub use context::CallContext;
pub use error::{ApiError, ConfigError, ConnectionError, Operation, RequestScope, SessionError};
pub use logging::{Field, Level, LogPort, LogRecord, MemoryLog, TracingLog};
pub use resolver::{ConfigSource, ConnectionParameters, DiscoveryEnv, InClusterConfig, resolve};
pub use session::{ApiSession, KubeSession};
pub use transform::{extract_images, to_display_record};

// Re-export types that are used in our public API
pub use kubelist_types::{ClientConfig, DisplayRecord, ListOptions, Replicas};
