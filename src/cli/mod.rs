//! Eris command line interface.

pub mod commands;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Eris - a chat agent that learns its answers from feedback.
#[derive(Parser, Debug)]
#[command(name = "eris")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "eris.toml")]
    pub config: PathBuf,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates a configuration file and data directory.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Starts an interactive chat session.
    Chat,

    /// Answers a single message, optionally with feedback.
    Ask {
        /// The message.
        text: String,

        /// Rate the reply (1-5).
        #[arg(short, long, conflicts_with = "reply")]
        rating: Option<i64>,

        /// Replace the reply for this message.
        #[arg(long)]
        reply: Option<String>,
    },

    /// Teaches a reply for an input pattern.
    Teach {
        /// Input pattern.
        input: String,

        /// Reply to give when the pattern is found.
        reply: String,
    },

    /// Lists stored rules in matching order.
    Rules {
        /// Maximum number of rules to show.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Loads the seed rules into the store.
    Seed,

    /// Exports rules to a JSON file.
    Export {
        /// Output file.
        output: PathBuf,
    },

    /// Imports rules from a JSON file.
    Import {
        /// Input file.
        input: PathBuf,

        /// Overwrite the reply of rules that already exist.
        #[arg(long)]
        overwrite: bool,
    },

    /// Edits the configuration interactively.
    Config,

    /// Shows version.
    Version,
}
