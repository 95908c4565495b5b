//! CLI entry point for mcpmux.

pub mod tools;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// mcpmux CLI
#[derive(Parser, Debug)]
#[command(name = "mcpmux", version, about = "Aggregate tools from many MCP servers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every tool the configured endpoints expose
    List(ListArgs),
    /// Invoke one aggregated tool and print its result
    Call(CallArgs),
}

/// Where to find endpoints and who is calling.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// TOML file with `[[endpoints]]` tables
    #[arg(short, long)]
    pub config: PathBuf,

    /// Caller identity bound into designated tools
    #[arg(short, long)]
    pub identity: Option<String>,
}

/// Arguments for `mcpmux list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub target: EndpointArgs,
}

/// Arguments for `mcpmux call`.
#[derive(Parser, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub target: EndpointArgs,

    /// Tool name
    #[arg(short, long)]
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub args: String,
}
