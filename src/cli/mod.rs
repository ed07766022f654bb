//! CLI module for admitctl
//!
//! Subcommands:
//! - `admitctl validate` - Check a deployment batch against the cluster
//! - `admitctl capacity` - Show capacity left for APIs after reservations
//! - `admitctl serve` - Run the HTTP admission endpoint

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "admitctl")]
#[command(about = "Validate API deployment batches against cluster capacity and routes")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.admitctl/config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a .env file (e.g. holding ADMITCTL_CLUSTER_TOKEN)
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a batch of deployments
    Validate(ValidateArgs),

    /// Show raw, reserved and available capacity of the instance class
    Capacity(ClusterArgs),

    /// Serve admission decisions over HTTP
    Serve(ServeArgs),
}

/// Where cluster state is read from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Read cluster state from a snapshot file instead of the cluster API
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Cluster control-plane URL (overrides the config file)
    #[arg(long, env = "ADMITCTL_CLUSTER_URL")]
    pub cluster_url: Option<String>,

    /// Instance class to validate against (overrides the config file)
    #[arg(long)]
    pub instance_class: Option<String>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Batch file: a JSON or YAML list of deployment requests
    pub file: PathBuf,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Bind address for the server
    #[arg(long, default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(flatten)]
    pub cluster: ClusterArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Default port of the admission endpoint
pub const DEFAULT_PORT: u16 = 8888;
