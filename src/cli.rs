// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: One subcommand per stage plus `run` for a whole release.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "taskroll")]
#[command(about = "Rolling image deployments for container services and scheduled tasks")]
#[command(version)]
pub struct Cli {
    /// Platform snapshot to act on (overrides `platform` in taskroll.yml)
    #[arg(long, global = true, value_name = "SNAPSHOT")]
    pub platform: Option<PathBuf>,

    /// Log at debug level regardless of LOG_LEVEL
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand a release into work items stamped with the deployment role
    Init {
        /// Release JSON file, or `-` for stdin
        input: String,
    },

    /// Roll the image out to one service
    Deploy {
        /// Service work item JSON file, or `-` for stdin
        input: String,
    },

    /// Roll the image out to one scheduled task
    Task {
        /// Scheduled task work item JSON file, or `-` for stdin
        input: String,
    },

    /// Check that a service's running tasks use the deployed revision
    Validate {
        /// Deploy record JSON file, or `-` for stdin
        input: String,
    },

    /// Run every stage for every target of a release
    Run {
        /// Release JSON file, or `-` for stdin
        input: String,

        /// Only print the final result
        #[arg(short, long)]
        quiet: bool,

        /// Print the report as JSON
        #[arg(long, conflicts_with = "quiet")]
        json: bool,
    },
}
