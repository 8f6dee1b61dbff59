//! API session port and its implementations

#[cfg(any(test, feature = "testing"))]
mod fake;
mod live;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::ListParams;

use crate::context::CallContext;

#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeCall, FakeFailure, FakeSession};
pub use live::KubeSession;

/// The subset of the Kubernetes API the client needs.
///
/// Implementations receive the context the call is bounded by; the client
/// enforces the deadline and cancellation around each call.
#[async_trait]
pub trait ApiSession: Send + Sync {
    /// Cheap reachability check: list at most one namespace.
    /// Returns how many namespaces came back.
    async fn ping(&self, ctx: &CallContext) -> Result<usize, kube::Error>;

    /// Version string reported by the API server
    async fn server_version(&self, ctx: &CallContext) -> Result<String, kube::Error>;

    /// List deployments cluster-wide (`None`) or in one namespace
    async fn list_deployments(
        &self,
        ctx: &CallContext,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<Deployment>, kube::Error>;
}
