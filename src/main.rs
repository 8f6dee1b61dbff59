mod cli;
mod commands;
mod settings;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use kubelist_k8s::{CallContext, LogPort, TracingLog};

use cli::{Cli, Command, ListResource};
use commands::{ConnectionRequest, EXIT_CONFIG, ListRequest};
use settings::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();

    // Version output stays free of log lines
    if let Command::Version = args.command {
        println!("kubelist version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let level = args
        .log_level
        .as_deref()
        .or(settings.log_level.as_deref())
        .unwrap_or(telemetry::DEFAULT_LOG_LEVEL);
    telemetry::init(level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting kubelist");

    let ctx = CallContext::background();
    cancel_on_ctrl_c(&ctx);
    let log: Arc<dyn LogPort> = Arc::new(TracingLog::default());

    match args.command {
        Command::List {
            resource: ListResource::Deployments(list_args),
        } => {
            let request = ListRequest::new(list_args, &settings);
            commands::run_list_deployments(&request, &ctx, log).await
        }
        Command::Connection(conn_args) => {
            let request = ConnectionRequest::new(conn_args, &settings);
            commands::run_connection(&request, &ctx, log).await
        }
        Command::Version => ExitCode::SUCCESS,
    }
}

/// Cancel in-flight API calls on the first Ctrl-C
fn cancel_on_ctrl_c(ctx: &CallContext) {
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
}
