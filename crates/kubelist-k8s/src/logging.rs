//! Narrow logging port used by the client
//!
//! The client only needs leveled messages with key-value context, so it talks
//! to a `LogPort` rather than to a concrete subscriber.

use std::fmt;

use parking_lot::Mutex;

/// Log severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single key-value pair attached to a log message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(key: &'static str, value: impl fmt::Display) -> Self {
        Self {
            key,
            value: value.to_string(),
        }
    }
}

pub trait LogPort: Send + Sync {
    fn log(&self, level: Level, message: &str, fields: &[Field]);

    fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }
}

// ============================================================================
// tracing adapter
// ============================================================================

/// Forwards log calls to `tracing`, tagged with a component name
#[derive(Clone, Debug)]
pub struct TracingLog {
    component: &'static str,
}

impl TracingLog {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Default for TracingLog {
    fn default() -> Self {
        Self::new("k8s-client")
    }
}

/// Fields split into the keys emitted as first-class `tracing` fields and
/// the remainder, which is rendered as one `k=v k=v` string
#[derive(Debug, Default, PartialEq, Eq)]
struct Structured<'a> {
    context: Option<&'a str>,
    cluster: Option<&'a str>,
    namespace: Option<&'a str>,
    host: Option<&'a str>,
    error: Option<&'a str>,
    count: Option<&'a str>,
    rest: Option<String>,
}

impl<'a> Structured<'a> {
    fn split(fields: &'a [Field]) -> Self {
        let mut out = Self::default();
        let mut rest = Vec::new();
        for field in fields {
            let value = Some(field.value.as_str());
            match field.key {
                "context" => out.context = value,
                "cluster" => out.cluster = value,
                "namespace" => out.namespace = value,
                "host" => out.host = value,
                "error" => out.error = value,
                "count" => out.count = value,
                _ => rest.push(field),
            }
        }
        if !rest.is_empty() {
            out.rest = Some(
                rest.iter()
                    .map(|f| format!("{}={}", f.key, f.value))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        out
    }
}

macro_rules! emit {
    ($level:expr, $component:ident, $s:ident, $message:ident) => {
        tracing::event!(
            $level,
            component = $component,
            context = $s.context,
            cluster = $s.cluster,
            namespace = $s.namespace,
            host = $s.host,
            error = $s.error,
            count = $s.count,
            fields = $s.rest.as_deref(),
            "{}",
            $message
        )
    };
}

impl LogPort for TracingLog {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        let s = Structured::split(fields);
        let component = self.component;
        match level {
            Level::Debug => emit!(tracing::Level::DEBUG, component, s, message),
            Level::Info => emit!(tracing::Level::INFO, component, s, message),
            Level::Warn => emit!(tracing::Level::WARN, component, s, message),
            Level::Error => emit!(tracing::Level::ERROR, component, s, message),
        }
    }
}

// ============================================================================
// In-memory recorder
// ============================================================================

/// A captured log call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
}

impl LogRecord {
    /// Value of a field, if present
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }
}

/// Records every log call; used to assert on diagnostics in tests
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// First record whose message contains `needle`
    pub fn find(&self, needle: &str) -> Option<LogRecord> {
        self.records
            .lock()
            .iter()
            .find(|r| r.message.contains(needle))
            .cloned()
    }
}

impl LogPort for MemoryLog {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            fields: fields.to_vec(),
        });
    }
}
