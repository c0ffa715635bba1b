use crate::server;
use crate::simulate::{run_ruleset, run_score, run_simulate, RulesetArgs, ScoreArgs, SimulateArgs};
use clap::{Args, Parser, Subcommand};
use fincra_core::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "FinCRA",
    about = "Score compliance risk assessments over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single record from a JSON file
    Score(ScoreArgs),
    /// Score a JSON or CSV batch and summarize the risk distribution
    Simulate(SimulateArgs),
    /// Describe an engine configuration in plain language
    Ruleset(RulesetArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory holding the five scorecard tables
    #[arg(long)]
    pub(crate) scorecards: Option<PathBuf>,
    /// JSON file the rule builder configuration is read from and saved to
    #[arg(long)]
    pub(crate) engine_config: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Simulate(args) => run_simulate(args),
        Command::Ruleset(args) => run_ruleset(args),
    }
}
