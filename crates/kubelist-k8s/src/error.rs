use kube::config::KubeconfigError;
use thiserror::Error;

use crate::classify::{UserFacingError, classify};

/// Failure to work out how to reach the cluster
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("kubeconfig file not found at {path}")]
    Missing { path: String },

    #[error("failed to read kubeconfig at {path}")]
    Unreadable {
        path: String,
        #[source]
        source: KubeconfigError,
    },

    #[error("no context given and no current-context set in kubeconfig at {path}")]
    NoContext { path: String },

    #[error("context '{context}' not found in kubeconfig at {path}")]
    UnknownContext { context: String, path: String },

    #[error("invalid kubeconfig at {path}")]
    Invalid {
        path: String,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to create Kubernetes client from {path}")]
    Client {
        path: String,
        #[source]
        source: kube::Error,
    },
}

impl ConfigError {
    /// The configuration location resolution was attempting
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path }
            | Self::Unreadable { path, .. }
            | Self::NoContext { path }
            | Self::UnknownContext { path, .. }
            | Self::Invalid { path, .. }
            | Self::Client { path, .. } => path,
        }
    }
}

/// Failure of a single call against the API server
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("request cancelled")]
    Cancelled,
}

/// What the client was doing when a call failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    ConnectionTest,
    ListDeployments,
}

impl Operation {
    /// Verb phrase used in error messages
    pub fn action(&self) -> &'static str {
        match self {
            Self::ConnectionTest => "connect to Kubernetes API",
            Self::ListDeployments => "list deployments",
        }
    }
}

/// The request a failure belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestScope {
    pub operation: Operation,

    /// Namespace explicitly requested (None = all namespaces)
    pub namespace: Option<String>,
}

impl RequestScope {
    pub fn connection_test() -> Self {
        Self {
            operation: Operation::ConnectionTest,
            namespace: None,
        }
    }

    pub fn list_deployments(namespace: Option<&str>) -> Self {
        Self {
            operation: Operation::ListDeployments,
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
        }
    }
}

/// The reachability check failed
#[derive(Debug, Error)]
#[error("failed to connect to Kubernetes API")]
pub struct ConnectionError {
    #[source]
    pub source: SessionError,
}

impl ConnectionError {
    pub fn classify(self) -> UserFacingError {
        classify(self.source, &RequestScope::connection_test())
    }
}

/// A list call failed
#[derive(Debug, Error)]
#[error("failed to {}", .scope.operation.action())]
pub struct ApiError {
    pub scope: RequestScope,
    #[source]
    pub source: SessionError,
}

impl ApiError {
    pub fn classify(self) -> UserFacingError {
        classify(self.source, &self.scope)
    }
}
