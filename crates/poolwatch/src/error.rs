//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use poolwatch_config::ConfigError;
use poolwatch_gateway::DiscoveryError;

/// Exit codes for failure classes the CLI distinguishes.
pub mod exit_code {
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NETWORK: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Discovery scan failed")]
    #[diagnostic(
        code(poolwatch::discovery_failed),
        help(
            "Check that this host has a network interface that allows UDP broadcast.\n\
             Gateways answer on UDP port 1444."
        )
    )]
    Discovery {
        #[source]
        source: DiscoveryError,
    },

    #[error("Cannot load settings from {path}")]
    #[diagnostic(
        code(poolwatch::config),
        help(
            "Create a settings file with a [device] table:\n\
             \n\
             [device]\n\
             device_id = \"01-02-03\"\n\
             address = \"192.168.1.10\""
        )
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("No device id given and none configured")]
    #[diagnostic(
        code(poolwatch::no_device),
        help("Pass a device id (poolwatch resolve 01-02-03) or set device_id in the settings file.")
    )]
    NoDevice,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Discovery { .. } => exit_code::NETWORK,
            CliError::Config { .. } => exit_code::CONFIG,
            CliError::NoDevice => exit_code::USAGE,
        }
    }
}
