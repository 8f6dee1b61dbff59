use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use kubelist_k8s::{CallContext, Client, ConnectionReport, DiscoveryEnv, Field, LogPort};
use kubelist_types::ClientConfig;

use super::{CommandError, report};
use crate::cli::ConnectionArgs;
use crate::settings::Settings;

pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub client: ClientConfig,
    pub timeout: Duration,
}

impl ConnectionRequest {
    pub fn new(args: ConnectionArgs, settings: &Settings) -> Self {
        Self {
            client: ClientConfig::new(
                args.cluster.kubeconfig.or_else(|| settings.kubeconfig.clone()),
                args.cluster.context.or_else(|| settings.context.clone()),
            ),
            timeout: args
                .timeout
                .or(settings.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT),
        }
    }
}

pub async fn run_connection(
    request: &ConnectionRequest,
    ctx: &CallContext,
    log: Arc<dyn LogPort>,
) -> ExitCode {
    log.info("Testing Kubernetes API connection...", &[]);

    let env = DiscoveryEnv::from_process();
    match check_connection(request, ctx, &env, log.clone()).await {
        Ok(report) => {
            println!("{}", summary(&report));
            ExitCode::SUCCESS
        }
        Err(err) => report(err, log.as_ref()),
    }
}

async fn check_connection(
    request: &ConnectionRequest,
    ctx: &CallContext,
    env: &DiscoveryEnv,
    log: Arc<dyn LogPort>,
) -> Result<ConnectionReport, CommandError> {
    let client = Client::create(&request.client, env, log.clone()).await?;
    let ctx = ctx.child_with_timeout(request.timeout);
    let result = verify(&client, &ctx, log.as_ref()).await;
    client.close();
    result
}

async fn verify(
    client: &Client,
    ctx: &CallContext,
    log: &dyn LogPort,
) -> Result<ConnectionReport, CommandError> {
    let report = client
        .test_connection(ctx)
        .await
        .map_err(|e| e.classify())?;

    log.info(
        "Connection test successful",
        &[
            Field::new("context", &client.parameters().context),
            Field::new("cluster", &client.parameters().cluster),
        ],
    );
    Ok(report)
}

fn summary(report: &ConnectionReport) -> String {
    match &report.server_version {
        Some(version) => format!(
            "Connection test successful: {} is reachable (server {version})",
            report.host
        ),
        None => format!("Connection test successful: {} is reachable", report.host),
    }
}
