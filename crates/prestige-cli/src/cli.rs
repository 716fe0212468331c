use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prestige",
    about = "Prestige: the Matchup Ranker API stack",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (defaults to ./prestige.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and print the stack topology
    Synth(SynthArgs),
    /// Print the credential policy of every compute unit
    Policies(PoliciesArgs),
    /// Show the changes against a previously recorded state
    Plan(PlanArgs),
    /// Inspect compute unit artifacts on disk
    Check(CheckArgs),
    /// Deploy in-process with stub handlers and serve the API
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct SynthArgs {
    /// Write a state record to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct PoliciesArgs {
    /// Only this compute unit
    pub unit: Option<String>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// State record written by `synth --out`
    #[arg(short, long)]
    pub previous: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
