//! Shared types for kubelist
//!
//! This crate contains the data structures passed between the kubelist crates,
//! together with the pure validation of user input.

mod validate;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use validate::{MAX_NAMESPACE_LEN, ValidationError, validate_namespace, validate_output_format};

// ============================================================================
// Request Types
// ============================================================================

/// Where to find cluster credentials
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Explicit kubeconfig path (None = discover)
    pub kubeconfig: Option<PathBuf>,

    /// Context overriding the kubeconfig's current-context
    pub context: Option<String>,
}

impl ClientConfig {
    pub fn new(kubeconfig: Option<PathBuf>, context: Option<String>) -> Self {
        Self {
            kubeconfig: kubeconfig.filter(|p| !p.as_os_str().is_empty()),
            context: context.filter(|c| !c.is_empty()),
        }
    }
}

/// Filters for a deployment list call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

impl ListOptions {
    /// List across all namespaces
    pub fn all_namespaces() -> Self {
        Self::default()
    }

    /// List within a single namespace (an empty name means all namespaces)
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()).filter(|ns| !ns.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_field_selector(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into()).filter(|s| !s.is_empty());
        self
    }

    /// The requested namespace, if the request is namespace-scoped
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Which namespaces the request targets
    pub fn scope(&self) -> NamespaceScope {
        match self.namespace() {
            Some(_) => NamespaceScope::Single,
            None => NamespaceScope::All,
        }
    }
}

/// Whether a list request targeted one namespace or all of them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamespaceScope {
    All,
    Single,
}

/// Supported output formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Table, Self::Json, Self::Yaml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_output_format(s)
    }
}

// ============================================================================
// Display Types
// ============================================================================

/// Replica counters of a deployment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replicas {
    pub desired: i32,
    pub available: i32,
    pub ready: i32,
    pub updated: i32,
}

impl Replicas {
    /// Format replica status as "ready/desired"
    pub fn ready_status(&self) -> String {
        format!("{}/{}", self.ready, self.desired)
    }
}

/// Presentation-ready view of a deployment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub name: String,
    pub namespace: String,
    pub replicas: Replicas,

    /// Time since creation, serialized as whole seconds
    #[serde(with = "age_seconds")]
    pub age: Duration,

    /// Container images, deduplicated, in order of first occurrence
    pub images: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl DisplayRecord {
    pub fn new(name: String, namespace: String, created_at: DateTime<Utc>) -> Self {
        Self {
            name,
            namespace,
            replicas: Replicas::default(),
            age: Duration::ZERO,
            images: Vec::new(),
            created_at,
        }
    }
}

mod age_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(age: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(age.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
