mod cmd_preview;
mod cmd_run;
mod cmd_validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "weft",
    version,
    about = "Synthesize a multi-author git history over an existing working tree"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a plan against a working tree
    Run {
        /// Plan file (YAML)
        plan: PathBuf,
        /// Working-tree root (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Override the plan's RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the planned timeline without touching the repository
    Preview {
        /// Plan file (YAML)
        plan: PathBuf,
        /// Override the plan's RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Parse and validate a plan file
    Validate {
        /// Plan file (YAML)
        plan: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run { plan, repo, seed } => cmd_run::execute(&plan, repo.as_deref(), seed),
        Command::Preview { plan, seed } => cmd_preview::execute(&plan, seed),
        Command::Validate { plan } => cmd_validate::execute(&plan),
    }
}
