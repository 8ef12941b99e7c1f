//! Section Match Filter CLI
//!
//! Keeps only the point matches whose endpoints lie inside the region of
//! interest of their own section.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use section_match_cli::commands::filter::FilterCommand;
use section_match_cli::commands::groups::GroupsCommand;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "section-match-filter",
    version,
    about = "Filter point matches that start or end outside their section's region polygon",
    after_help = "EXAMPLES:\n  \
                  # Filter using a JSON job file\n  \
                  section-match-filter filter --input-json job.json\n\n  \
                  # Override the worker count and keep going past failing groups\n  \
                  section-match-filter filter --input-json job.json --workers 8 --continue-on-error\n\n  \
                  # Filter two groups only\n  \
                  section-match-filter filter --input-json job.json --group 101.0 --group 102.0\n\n  \
                  # List origin groups of the source collection\n  \
                  section-match-filter groups --input-json job.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter matches and republish the survivors to the target collection
    Filter(FilterCommand),

    /// List origin groups of the source collection
    Groups(GroupsCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match &cli.command {
        Commands::Groups(_) => Level::WARN,
        Commands::Filter(_) => {
            if cli.verbose {
                Level::DEBUG
            } else {
                Level::INFO
            }
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(cli.verbose)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Filter(cmd) => cmd.execute(),
        Commands::Groups(cmd) => cmd.execute(),
    }
}
