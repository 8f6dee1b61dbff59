use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// kubelist - list Kubernetes deployments from the command line
#[derive(Parser, Debug)]
#[command(name = "kubelist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Settings file (default: $KUBELIST_CONFIG or ~/.config/kubelist/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List Kubernetes resources
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Test Kubernetes API connectivity
    Connection(ConnectionArgs),

    /// Print the version number
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ListResource {
    /// List deployments in one namespace or across all namespaces
    Deployments(ListDeploymentsArgs),
}

/// Flags selecting the cluster to talk to
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Path to kubeconfig file (default: $KUBECONFIG or ~/.kube/config)
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubernetes context to use (default: current context from kubeconfig)
    #[arg(long, value_name = "NAME")]
    pub context: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListDeploymentsArgs {
    /// Namespace to list from (default: all namespaces)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format: table, json or yaml
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<String>,

    /// Label selector, e.g. app=nginx
    #[arg(short = 'l', long = "selector", value_name = "SELECTOR")]
    pub label_selector: Option<String>,

    /// Field selector, e.g. metadata.name=web
    #[arg(long, value_name = "SELECTOR")]
    pub field_selector: Option<String>,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Connection timeout in seconds [default: 10]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
