use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "waiterbot")]
#[command(version)]
#[command(about = "Restaurant-waiter chat backend with per-session conversation history", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat interactively in the terminal
    Chat {
        /// Session id to use (generated if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Send a single message and print the reply
    Ask {
        /// Message to send
        message: String,
        /// Session id to use (generated if omitted)
        #[arg(short, long)]
        session: Option<String>,
        /// Print the reply as JSON
        #[arg(long)]
        json: bool,
    },
    /// Transcribe an audio file
    Transcribe {
        /// Audio file (format inferred from extension)
        file: PathBuf,
    },
    /// Initialize configuration
    Init,
    /// Show version information
    Version,
    /// Check configuration and provider reachability
    Status,
}
