//! Rewrites API failures into actionable messages
//!
//! Classification looks at the HTTP status of API errors first and falls back
//! to well-known substrings of the error chain. The original error is always
//! kept as the source.

use std::error::Error as StdError;

use thiserror::Error;

use crate::error::{RequestScope, SessionError};

#[derive(Debug, Error)]
pub enum UserFacingError {
    #[error("cannot reach the Kubernetes API - verify the cluster is running and reachable")]
    Unreachable {
        #[source]
        source: SessionError,
    },

    #[error("insufficient permissions to {action} - check your RBAC configuration")]
    Forbidden {
        action: &'static str,
        #[source]
        source: SessionError,
    },

    #[error("namespace '{namespace}' not found")]
    NamespaceNotFound {
        namespace: String,
        #[source]
        source: SessionError,
    },

    #[error("cancelled while trying to {action}")]
    Cancelled {
        action: &'static str,
        #[source]
        source: SessionError,
    },

    #[error("failed to {action}")]
    Failed {
        action: &'static str,
        #[source]
        source: SessionError,
    },
}

impl UserFacingError {
    /// The underlying session failure
    pub fn root(&self) -> &SessionError {
        match self {
            Self::Unreachable { source }
            | Self::Forbidden { source, .. }
            | Self::NamespaceNotFound { source, .. }
            | Self::Cancelled { source, .. }
            | Self::Failed { source, .. } => source,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Category {
    Unreachable,
    Forbidden,
    NotFound,
    Cancelled,
    Other,
}

const UNREACHABLE_PATTERNS: &[&str] = &[
    "connection refused",
    "no route to host",
    "dns error",
    "connection reset",
    "timed out",
];

const FORBIDDEN_PATTERNS: &[&str] = &["forbidden", "permission denied", "unauthorized"];

/// Turn a session failure into a user-facing error for the given request
pub fn classify(source: SessionError, scope: &RequestScope) -> UserFacingError {
    let action = scope.operation.action();
    match categorize(&source) {
        Category::Unreachable => UserFacingError::Unreachable { source },
        Category::Forbidden => UserFacingError::Forbidden { action, source },
        Category::Cancelled => UserFacingError::Cancelled { action, source },
        Category::NotFound => match &scope.namespace {
            Some(namespace) => UserFacingError::NamespaceNotFound {
                namespace: namespace.clone(),
                source,
            },
            None => UserFacingError::Failed { action, source },
        },
        Category::Other => UserFacingError::Failed { action, source },
    }
}

fn categorize(err: &SessionError) -> Category {
    match err {
        SessionError::Cancelled => Category::Cancelled,
        SessionError::DeadlineExceeded => Category::Unreachable,
        SessionError::Kube(kube::Error::Api(response)) => match response.code {
            401 | 403 => Category::Forbidden,
            404 => Category::NotFound,
            _ => categorize_message(&response.message),
        },
        SessionError::Kube(other) => categorize_message(&error_chain_text(other)),
    }
}

fn categorize_message(message: &str) -> Category {
    let message = message.to_lowercase();
    if UNREACHABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        Category::Unreachable
    } else if FORBIDDEN_PATTERNS.iter().any(|p| message.contains(p)) {
        Category::Forbidden
    } else if message.contains("not found") {
        Category::NotFound
    } else {
        Category::Other
    }
}

/// Display text of an error and all of its sources
fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        current = cause.source();
    }
    text
}
