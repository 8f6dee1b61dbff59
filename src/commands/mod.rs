//! Subcommand implementations

mod connection;
mod list;

use std::process::ExitCode;

use thiserror::Error;

use kubelist_k8s::{ConfigError, Field, LogPort, UserFacingError};
use kubelist_output::OutputError;
use kubelist_types::ValidationError;

pub use connection::{ConnectionRequest, run_connection};
pub use list::{ListRequest, run_list_deployments};

pub const EXIT_VALIDATION: u8 = 2;
pub const EXIT_CONFIG: u8 = 3;
pub const EXIT_CLUSTER: u8 = 4;
pub const EXIT_OUTPUT: u8 = 5;

/// Everything a command can fail with
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cluster(#[from] UserFacingError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl CommandError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => EXIT_VALIDATION,
            Self::Config(_) => EXIT_CONFIG,
            Self::Cluster(_) => EXIT_CLUSTER,
            Self::Output(_) => EXIT_OUTPUT,
        }
    }
}

/// Log a failure and print it with its cause chain to stderr
fn report(err: CommandError, log: &dyn LogPort) -> ExitCode {
    let code = err.exit_code();
    let message = err.to_string();
    let err = anyhow::Error::new(err);

    log.error(&message, &[Field::new("error", format!("{err:#}"))]);
    eprintln!("Error: {err:#}");

    ExitCode::from(code)
}
