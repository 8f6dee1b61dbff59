//! Validation of user input, run before any API call

use thiserror::Error;

use crate::OutputFormat;

/// Namespace names are DNS labels
pub const MAX_NAMESPACE_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid namespace: namespace name too long ({len} characters, max 63)")]
    NamespaceTooLong { len: usize },

    #[error(
        "invalid namespace: namespace name contains invalid character '{ch}' (must be lowercase alphanumeric with hyphens)"
    )]
    NamespaceInvalidChar { ch: char },

    #[error("invalid namespace: namespace name cannot start or end with hyphen")]
    NamespaceHyphenEdge,

    #[error("invalid output format: unsupported format '{0}', must be one of: table, json, yaml")]
    UnsupportedFormat(String),
}

/// Validate a namespace filter. The empty string selects all namespaces.
pub fn validate_namespace(ns: &str) -> Result<(), ValidationError> {
    if ns.is_empty() {
        return Ok(());
    }

    if ns.len() > MAX_NAMESPACE_LEN {
        return Err(ValidationError::NamespaceTooLong { len: ns.len() });
    }

    let last = ns.len() - 1;
    for (pos, ch) in ns.char_indices() {
        if !is_namespace_char(ch) {
            return Err(ValidationError::NamespaceInvalidChar { ch });
        }
        if ch == '-' && (pos == 0 || pos == last) {
            return Err(ValidationError::NamespaceHyphenEdge);
        }
    }

    Ok(())
}

fn is_namespace_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'
}

/// Parse an output format selector. Matching is exact and case-sensitive.
pub fn validate_output_format(format: &str) -> Result<OutputFormat, ValidationError> {
    OutputFormat::ALL
        .into_iter()
        .find(|f| f.as_str() == format)
        .ok_or_else(|| ValidationError::UnsupportedFormat(format.to_string()))
}
