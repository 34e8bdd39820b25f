//! Clap derive structures for the `poolwatch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// poolwatch -- pool-controller gateway tools
#[derive(Debug, Parser)]
#[command(
    name = "poolwatch",
    version,
    about = "Discover and resolve pool-controller gateways on the local network",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "POOLWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the local network for gateways
    Discover(DiscoverArgs),

    /// Resolve connect info for a device (rediscovery with static fallback)
    Resolve(ResolveArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Scan deadline in milliseconds
    #[arg(long, default_value = "1000")]
    pub timeout_ms: u64,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Short device id (`XX-XX-XX`); defaults to the configured device
    pub device_id: Option<String>,

    /// Scan deadline in milliseconds (overrides settings)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
