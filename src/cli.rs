// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Crash-consistent release and rollback manager")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON-lines output (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new gantry.yml configuration file
    Init {
        /// Project name
        #[arg(short, long)]
        project: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Deploy an artifact as a new release
    Deploy {
        /// Path or file:// URI of the built artifact
        artifact: String,

        /// Allow a first-ever deploy with no prior live release
        #[arg(long)]
        bootstrap: bool,

        /// Break a held deploy lock
        #[arg(long)]
        force: bool,
    },

    /// Re-promote an earlier release
    Rollback {
        /// Specific release id to roll back to
        #[arg(long, conflicts_with = "previous")]
        to: Option<String>,

        /// Roll back to the most recently superseded release (default)
        #[arg(long)]
        previous: bool,

        /// Break a held deploy lock
        #[arg(long)]
        force: bool,
    },

    /// List all known releases, newest first
    ListReleases,

    /// Show the live release and any stranded attempt
    Status,

    /// Purge old releases beyond the retention policy
    Prune {
        /// Override the configured keep count for superseded releases
        #[arg(long)]
        keep: Option<usize>,
    },

    /// Abort a release left in Verifying by an interrupted attempt
    Abort,
}
