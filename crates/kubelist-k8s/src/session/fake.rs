//! In-memory session for exercising the client without a cluster

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::ListParams;
use kube::core::ErrorResponse;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::ApiSession;
use crate::context::CallContext;

/// A canned failure the fake reports instead of data
#[derive(Clone, Debug)]
pub enum FakeFailure {
    /// Transport-level refusal, as when nothing listens on the API port
    ConnectionRefused,

    /// An API status response
    Status {
        code: u16,
        reason: String,
        message: String,
    },
}

impl FakeFailure {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Status {
            code: 403,
            reason: "Forbidden".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Status {
            code: 404,
            reason: "NotFound".to_string(),
            message: message.into(),
        }
    }

    fn to_kube_error(&self) -> kube::Error {
        match self {
            Self::ConnectionRefused => kube::Error::Service(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "tcp connect error: Connection refused (os error 111)",
            ))),
            Self::Status {
                code,
                reason,
                message,
            } => kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: message.clone(),
                reason: reason.clone(),
                code: *code,
            }),
        }
    }
}

/// A call the fake received
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FakeCall {
    Ping {
        deadline: Option<Instant>,
    },
    ServerVersion {
        deadline: Option<Instant>,
    },
    ListDeployments {
        deadline: Option<Instant>,
        namespace: Option<String>,
        label_selector: Option<String>,
        field_selector: Option<String>,
    },
}

#[derive(Default)]
struct FakeState {
    deployments: Vec<Deployment>,
    failure: Option<FakeFailure>,
    version: Option<String>,
    delay: Option<Duration>,
    calls: Vec<FakeCall>,
}

/// Session serving canned deployments or canned failures.
///
/// Clones share state, so a test can keep one handle and give another to
/// the client.
#[derive(Clone, Default)]
pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deployments(self, deployments: Vec<Deployment>) -> Self {
        self.state.lock().deployments = deployments;
        self
    }

    /// Make the ping and list calls fail
    pub fn failing_with(self, failure: FakeFailure) -> Self {
        self.state.lock().failure = Some(failure);
        self
    }

    /// Report this server version (version lookups fail otherwise)
    pub fn with_version(self, version: impl Into<String>) -> Self {
        self.state.lock().version = Some(version.into());
        self
    }

    /// Delay every response, for deadline and cancellation tests
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().delay = Some(delay);
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.lock().calls.clone()
    }

    fn record(&self, call: FakeCall) -> (Option<Duration>, Option<FakeFailure>) {
        let mut state = self.state.lock();
        state.calls.push(call);
        (state.delay, state.failure.clone())
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ApiSession for FakeSession {
    async fn ping(&self, ctx: &CallContext) -> Result<usize, kube::Error> {
        let (delay, failure) = self.record(FakeCall::Ping {
            deadline: ctx.deadline(),
        });
        Self::pause(delay).await;

        if let Some(failure) = failure {
            return Err(failure.to_kube_error());
        }
        Ok(1)
    }

    async fn server_version(&self, ctx: &CallContext) -> Result<String, kube::Error> {
        let (delay, _) = self.record(FakeCall::ServerVersion {
            deadline: ctx.deadline(),
        });
        Self::pause(delay).await;

        let version = self.state.lock().version.clone();
        version.ok_or_else(|| {
            FakeFailure::not_found("the server could not find the requested resource")
                .to_kube_error()
        })
    }

    async fn list_deployments(
        &self,
        ctx: &CallContext,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<Deployment>, kube::Error> {
        let (delay, failure) = self.record(FakeCall::ListDeployments {
            deadline: ctx.deadline(),
            namespace: namespace.map(str::to_string),
            label_selector: params.label_selector.clone(),
            field_selector: params.field_selector.clone(),
        });
        Self::pause(delay).await;

        if let Some(failure) = failure {
            return Err(failure.to_kube_error());
        }

        let labels = params
            .label_selector
            .as_deref()
            .map(parse_equality_selector)
            .unwrap_or_default();

        let state = self.state.lock();
        Ok(state
            .deployments
            .iter()
            .filter(|d| namespace.is_none_or(|ns| d.metadata.namespace.as_deref() == Some(ns)))
            .filter(|d| matches_labels(d, &labels))
            .cloned()
            .collect())
    }
}

/// Parse `k=v,k2==v2`; other selector operators are ignored
fn parse_equality_selector(selector: &str) -> BTreeMap<String, String> {
    selector
        .split(',')
        .filter(|term| !term.contains('!'))
        .filter_map(|term| term.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim_start_matches('=').trim().to_string()))
        .collect()
}

fn matches_labels(deployment: &Deployment, wanted: &BTreeMap<String, String>) -> bool {
    let labels = deployment.metadata.labels.as_ref();
    wanted
        .iter()
        .all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn deployment(name: &str, namespace: &str, app: &str) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([("app".to_string(), app.to_string())])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_filters_by_namespace_and_labels() {
        let session = FakeSession::new().with_deployments(vec![
            deployment("web", "default", "nginx"),
            deployment("db", "default", "postgres"),
            deployment("dns", "kube-system", "coredns"),
        ]);
        let ctx = CallContext::background();

        let all = session
            .list_deployments(&ctx, None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let default_ns = session
            .list_deployments(&ctx, Some("default"), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(default_ns.len(), 2);

        let nginx = session
            .list_deployments(&ctx, None, &ListParams::default().labels("app=nginx"))
            .await
            .unwrap();
        assert_eq!(nginx.len(), 1);
        assert_eq!(nginx[0].metadata.name.as_deref(), Some("web"));

        assert_eq!(session.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_api_error() {
        let session = FakeSession::new().failing_with(FakeFailure::forbidden("forbidden"));
        let err = session.ping(&CallContext::background()).await.unwrap_err();
        assert!(matches!(err, kube::Error::Api(ref resp) if resp.code == 403));
    }

    #[test]
    fn test_parse_equality_selector() {
        let parsed = parse_equality_selector("app=web, tier==frontend,env!=prod");
        assert_eq!(parsed.get("app").map(String::as_str), Some("web"));
        assert_eq!(parsed.get("tier").map(String::as_str), Some("frontend"));
        assert_eq!(parsed.len(), 2);
    }
}
