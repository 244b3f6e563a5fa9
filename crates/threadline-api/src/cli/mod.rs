//! CLI command definitions and dispatch for the `tline` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod thread;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Thread-scoped conversation store with checkpointed history.
#[derive(Parser)]
#[command(name = "tline", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Address to bind, overriding the configured value.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Send a message on a thread and print the reply.
    Send {
        /// The message text.
        message: String,

        /// Thread to continue; a fresh UUID thread is started when omitted.
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Print the full transcript of a thread.
    History {
        /// Thread ID.
        thread: String,
    },

    /// Print a thread's portable export document as JSON.
    Export {
        /// Thread ID.
        thread: String,
    },

    /// List known thread IDs.
    #[command(alias = "ls")]
    Threads,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
