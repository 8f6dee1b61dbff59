use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use kubelist_k8s::{CallContext, Client, DiscoveryEnv, Field, LogPort};
use kubelist_output::{OutputError, render};
use kubelist_types::{
    ClientConfig, ListOptions, OutputFormat, ValidationError, validate_namespace,
    validate_output_format,
};

use super::{CommandError, report};
use crate::cli::ListDeploymentsArgs;
use crate::settings::Settings;

pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything `list deployments` needs, fixed once flags and settings are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub namespace: String,
    pub output: String,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
    pub client: ClientConfig,
    pub timeout: Duration,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListPlan {
    options: ListOptions,
    format: OutputFormat,
}

impl ListRequest {
    /// Merge flags over settings over defaults
    pub fn new(args: ListDeploymentsArgs, settings: &Settings) -> Self {
        let output = args
            .output
            .or_else(|| settings.output.clone())
            .unwrap_or_else(|| OutputFormat::default().to_string());
        let timeout = args
            .timeout
            .or(settings.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LIST_TIMEOUT);

        Self {
            namespace: args.namespace.unwrap_or_default(),
            output,
            label_selector: args.label_selector,
            field_selector: args.field_selector,
            client: ClientConfig::new(
                args.cluster.kubeconfig.or_else(|| settings.kubeconfig.clone()),
                args.cluster.context.or_else(|| settings.context.clone()),
            ),
            timeout,
        }
    }

    fn plan(&self) -> Result<ListPlan, ValidationError> {
        validate_namespace(&self.namespace)?;
        let format = validate_output_format(&self.output)?;

        let mut options = ListOptions::in_namespace(&self.namespace);
        if let Some(selector) = &self.label_selector {
            options = options.with_label_selector(selector);
        }
        if let Some(selector) = &self.field_selector {
            options = options.with_field_selector(selector);
        }

        Ok(ListPlan { options, format })
    }
}

/// Run `list deployments` and map the outcome to an exit code
pub async fn run_list_deployments(
    request: &ListRequest,
    ctx: &CallContext,
    log: Arc<dyn LogPort>,
) -> ExitCode {
    let env = DiscoveryEnv::from_process();

    let result = match list_deployments(request, ctx, &env, log.clone()).await {
        Ok(rendered) => write_output(io::stdout().lock(), &rendered).map_err(CommandError::from),
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err, log.as_ref()),
    }
}

/// Validate, fetch and render. Nothing is written until the whole list is in.
async fn list_deployments(
    request: &ListRequest,
    ctx: &CallContext,
    env: &DiscoveryEnv,
    log: Arc<dyn LogPort>,
) -> Result<String, CommandError> {
    let plan = request.plan()?;

    log.info(
        "Listing deployments",
        &[
            Field::new("namespace", plan.options.namespace().unwrap_or("<all>")),
            Field::new("output", plan.format),
            Field::new("label_selector", request.label_selector.as_deref().unwrap_or("")),
        ],
    );

    let client = Client::create(&request.client, env, log).await?;
    let ctx = ctx.child_with_timeout(request.timeout);
    let rendered = fetch_and_render(&client, &plan, &ctx).await;
    client.close();
    rendered
}

async fn fetch_and_render(
    client: &Client,
    plan: &ListPlan,
    ctx: &CallContext,
) -> Result<String, CommandError> {
    let records = client
        .list_deployments(ctx, &plan.options)
        .await
        .map_err(|e| e.classify())?;

    Ok(render(&records, plan.format, plan.options.scope())?)
}

fn write_output(out: impl Write, rendered: &str) -> Result<(), OutputError> {
    let mut out = BufWriter::new(out);
    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}
