use anyhow::Result;
use clap::Parser;

use waiterbot::{
    app::resolve_config,
    cli::{handle_command, Cli, Commands},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    // Load configuration
    let config = resolve_config(cli.config.as_deref())?;

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    handle_command(command, config).await
}
