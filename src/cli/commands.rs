use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    app::{get_config_dir, init_config, AppState, Config},
    models::ModelFactory,
    runtime::ChatReply,
    server,
    session::MENU_TEXT,
    utils::WaiterError,
};

use super::Commands;

/// Handle CLI subcommands
pub async fn handle_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config).await
        }
        Commands::Chat { session } => run_chat(config, session).await,
        Commands::Ask {
            message,
            session,
            json,
        } => ask(config, session, &message, json).await,
        Commands::Transcribe { file } => transcribe_file(config, &file).await,
        Commands::Init => {
            println!("Initializing WaiterBot configuration...");
            let path = init_config()?;
            println!("Configuration ready at: {}", path.display());
            Ok(())
        }
        Commands::Version => {
            show_version();
            Ok(())
        }
        Commands::Status => show_status(&config).await,
    }
}

/// Show version information
pub fn show_version() {
    println!("WaiterBot v{}", env!("CARGO_PKG_VERSION"));
    println!("   Restaurant-waiter chat backend");
}

fn print_reply(reply: &ChatReply) {
    let label = if reply.fallback {
        "waiter (fallback)".yellow()
    } else {
        "waiter".green()
    };
    println!("{}: {}", label.bold(), reply.reply);

    if let Some(summary) = reply.orders() {
        if !summary.is_empty() {
            println!("  {} {}", "order:".cyan(), summary);
        }
    }
}

fn print_error(err: &WaiterError) {
    eprintln!("{} {}", "[ERROR]".red(), err);
}

/// Interactive terminal chat on a single session
async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
    let state = AppState::from_config(config)?;
    let orchestrator = Arc::clone(&state.orchestrator);
    let mut session_id = session;

    println!("{}", MENU_TEXT.trim_end());
    println!(
        "{}",
        "Type a message, /reset to start over, /quit to leave.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                if let Some(id) = session_id.take() {
                    orchestrator.store().clear(&id);
                }
                println!("{}", "Started a new session.".dimmed());
                continue;
            }
            _ => {}
        }

        match orchestrator.handle_message(session_id.clone(), line).await {
            Ok(reply) => {
                session_id = Some(reply.session_id.clone());
                print_reply(&reply);
            }
            Err(err @ WaiterError::NotConfigured(_)) => {
                print_error(&err);
                break;
            }
            Err(err) => print_error(&err),
        }
    }

    Ok(())
}

/// One-shot message
async fn ask(config: Config, session: Option<String>, message: &str, json: bool) -> Result<()> {
    let state = AppState::from_config(config)?;
    let reply = state.orchestrator.handle_message(session, message).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        print_reply(&reply);
        println!("{} {}", "session:".dimmed(), reply.session_id.dimmed());
    }
    Ok(())
}

async fn transcribe_file(config: Config, file: &Path) -> Result<()> {
    let audio = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let format = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| crate::constants::DEFAULT_AUDIO_FORMAT.to_string());

    let state = AppState::from_config(config)?;
    let text = state.transcription.transcribe(&audio, &format).await?;
    println!("{}", text);
    Ok(())
}

/// Show configuration and provider status
async fn show_status(config: &Config) -> Result<()> {
    println!("WaiterBot Status:");
    println!();

    let key_env = &config.openai.api_key_env;
    if config.openai.api_key().is_some() {
        println!("  [OK] API key: {} is set", key_env);
    } else {
        println!("  [WARNING] API key: {} is not set", key_env);
        println!("      Chat fallback policy: {:?}", config.fallback.policy);
    }

    println!("  Chat model: {}", config.openai.chat_model.green());
    println!(
        "  Transcription model: {}",
        config.openai.transcription_model.green()
    );
    println!("  Provider: {}", config.openai.base_url);

    if let Some(model) = ModelFactory::from_config(config)? {
        if model.validate_connection().await.unwrap_or(false) {
            println!("  [OK] Provider reachable ({})", model.name());
        } else {
            println!("  [ERROR] Provider not reachable or key rejected");
        }
    }

    println!(
        "  History: max {} turns, {} kept on compaction",
        config.history.max_turns, config.history.retained_turns
    );
    match config.history.idle_ttl_secs {
        Some(ttl) => println!("  Idle session expiry: {}s", ttl),
        None => println!("  Idle session expiry: disabled"),
    }

    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  [OK] Configuration: {}", config_path.display());
    } else {
        println!("  [WARNING] Configuration: Not found (using defaults)");
    }

    println!();
    Ok(())
}
