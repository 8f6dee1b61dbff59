//! Rendering of deployment records for the terminal
//!
//! Tables are aligned the way `kubectl get` aligns them; JSON and YAML wrap
//! the records in a `DeploymentList` envelope.

mod json;
mod summary;
mod table;
mod yaml;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kubelist_types::{DisplayRecord, NamespaceScope, OutputFormat};

pub use json::JsonFormatter;
pub use summary::{format_age, format_images, truncate};
pub use table::{NO_RECORDS, TableFormatter};
pub use yaml::YamlFormatter;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to encode JSON output")]
    Json(#[source] serde_json::Error),

    #[error("failed to encode YAML output")]
    Yaml(#[source] serde_yaml::Error),

    #[error("failed to write output")]
    Write(#[from] std::io::Error),
}

/// Envelope for structured output.
///
/// `count` always equals `items.len()`; build it with [`DeploymentList::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentList {
    pub kind: String,
    pub api_version: String,
    pub items: Vec<DisplayRecord>,
    pub count: usize,
}

impl DeploymentList {
    pub const KIND: &'static str = "DeploymentList";
    pub const API_VERSION: &'static str = "apps/v1";

    pub fn new(items: &[DisplayRecord]) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            api_version: Self::API_VERSION.to_string(),
            items: items.to_vec(),
            count: items.len(),
        }
    }
}

/// Render `records` in the requested format.
///
/// `scope` is the namespace scope of the original request; the table shows
/// a NAMESPACE column only for all-namespace requests.
pub fn render(
    records: &[DisplayRecord],
    format: OutputFormat,
    scope: NamespaceScope,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Table => Ok(TableFormatter::format(records, scope)),
        OutputFormat::Json => JsonFormatter::format(records),
        OutputFormat::Yaml => YamlFormatter::format(records),
    }
}
