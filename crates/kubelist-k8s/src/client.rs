//! Kubernetes client wrapper

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kube::api::ListParams;

use crate::context::CallContext;
use crate::error::{ApiError, ConfigError, ConnectionError, RequestScope};
use crate::logging::{Field, LogPort};
use crate::resolver::{ConnectionParameters, DiscoveryEnv, resolve};
use crate::session::{ApiSession, KubeSession};
use crate::transform::to_display_record;
use kubelist_types::{ClientConfig, DisplayRecord, ListOptions};

/// Upper bound for the reachability check
pub const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound for the best-effort server version lookup, independent of the caller
pub const VERSION_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a successful connection test
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Namespaces returned by the one-item ping
    pub namespace_count: usize,
    pub host: String,
    pub server_version: Option<String>,
}

/// Authenticated handle to one cluster, owned by a single invocation
pub struct Client {
    session: Box<dyn ApiSession>,
    params: ConnectionParameters,
    log: Arc<dyn LogPort>,
    closed: bool,
}

impl Client {
    /// Resolve configuration and open a live session
    pub async fn create(
        config: &ClientConfig,
        env: &DiscoveryEnv,
        log: Arc<dyn LogPort>,
    ) -> Result<Self, ConfigError> {
        log.debug("Creating Kubernetes client", &[]);

        let params = resolve(config, env, log.as_ref()).await?;
        let client =
            kube::Client::try_from(params.config.clone()).map_err(|source| ConfigError::Client {
                path: params.source.to_string(),
                source,
            })?;

        log.info(
            "Kubernetes client created successfully",
            &[Field::new("host", params.host())],
        );
        Ok(Self::with_session(KubeSession::new(client), params, log))
    }

    /// Wrap an existing session
    pub fn with_session(
        session: impl ApiSession + 'static,
        params: ConnectionParameters,
        log: Arc<dyn LogPort>,
    ) -> Self {
        Self {
            session: Box::new(session),
            params,
            log,
            closed: false,
        }
    }

    pub fn parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Verify the API server answers a minimal list call.
    ///
    /// A caller deadline at most `CONNECTION_TEST_TIMEOUT` away is kept as
    /// is; otherwise the ping runs under a derived 10 second deadline.
    pub async fn test_connection(&self, ctx: &CallContext) -> Result<ConnectionReport, ConnectionError> {
        self.log.debug("Testing Kubernetes API connection", &[]);

        let ping_ctx = connection_test_context(ctx);
        let namespace_count = ping_ctx
            .run(self.session.ping(&ping_ctx))
            .await
            .map_err(|source| {
                self.log.error(
                    "Failed to connect to Kubernetes API",
                    &[Field::new("error", &source)],
                );
                ConnectionError { source }
            })?;

        let report = ConnectionReport {
            namespace_count,
            host: self.params.host(),
            server_version: self.lookup_server_version(ctx).await,
        };

        self.log.info(
            "Successfully connected to Kubernetes API",
            &[
                Field::new("namespace_count", report.namespace_count),
                Field::new("host", &report.host),
                Field::new(
                    "server_version",
                    report.server_version.as_deref().unwrap_or("unknown"),
                ),
            ],
        );
        Ok(report)
    }

    /// Best effort: failures are logged at debug level and swallowed
    async fn lookup_server_version(&self, ctx: &CallContext) -> Option<String> {
        let version_ctx = ctx.independent(VERSION_LOOKUP_TIMEOUT);
        match version_ctx
            .run(self.session.server_version(&version_ctx))
            .await
        {
            Ok(version) => Some(version),
            Err(e) => {
                self.log
                    .debug("Server version unavailable", &[Field::new("error", e)]);
                None
            }
        }
    }

    /// List deployments in one namespace, or in all of them when the
    /// options carry no namespace. Results keep API order.
    pub async fn list_deployments(
        &self,
        ctx: &CallContext,
        opts: &ListOptions,
    ) -> Result<Vec<DisplayRecord>, ApiError> {
        let namespace = opts.namespace();
        let params = list_params(opts);

        self.log.debug(
            "Listing deployments",
            &[
                Field::new("namespace", namespace.unwrap_or("<all>")),
                Field::new("label_selector", opts.label_selector.as_deref().unwrap_or("")),
                Field::new("field_selector", opts.field_selector.as_deref().unwrap_or("")),
            ],
        );

        let raw = ctx
            .run(self.session.list_deployments(ctx, namespace, &params))
            .await
            .map_err(|source| ApiError {
                scope: RequestScope::list_deployments(namespace),
                source,
            })?;

        let now = Utc::now();
        let records: Vec<DisplayRecord> =
            raw.iter().map(|d| to_display_record(d, now)).collect();

        self.log.debug(
            "Listed deployments",
            &[Field::new("count", records.len())],
        );
        Ok(records)
    }

    /// Release the session. Nothing is pooled yet, so this only logs.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.log.debug(
            "Closing Kubernetes client",
            &[Field::new("context", &self.params.context)],
        );
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.release();
    }
}

/// Context for the reachability check
fn connection_test_context(ctx: &CallContext) -> CallContext {
    match ctx.remaining() {
        Some(remaining) if remaining <= CONNECTION_TEST_TIMEOUT => ctx.clone(),
        _ => ctx.child_with_timeout(CONNECTION_TEST_TIMEOUT),
    }
}

fn list_params(opts: &ListOptions) -> ListParams {
    let mut params = ListParams::default();
    if let Some(labels) = opts.label_selector.as_deref().filter(|s| !s.is_empty()) {
        params = params.labels(labels);
    }
    if let Some(fields) = opts.field_selector.as_deref().filter(|s| !s.is_empty()) {
        params = params.fields(fields);
    }
    params
}
