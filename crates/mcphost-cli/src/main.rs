//! mcphost - terminal chat with MCP tool providers
//!
//! Loads `.env`, reads the host configuration, starts every configured tool
//! provider, then reads user messages from stdin. Logs go to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use mcphost_core::config::{ConfigLevel, FileConfigProvider};
use mcphost_core::{
    create_model_backend, CancellationToken, ConsoleLogger, ConversationEngine, ConversationTurn,
    EngineConfig, EngineError, Logger, NoOpLogger, ProviderPool, StdioConnector,
};

#[derive(Parser, Debug)]
#[command(name = "mcphost")]
#[command(about = "Chat with a language model that can call MCP tool providers")]
struct Args {
    /// Host configuration file (defaults to .config/mcphost/config.yaml, then the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the model backend (openai, anthropic, ollama, mock, ...)
    #[arg(long)]
    backend: Option<String>,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    /// Log to stderr; repeat for debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env is fine; keys may already be in the environment
    let _ = dotenvy::dotenv();

    let logger: Arc<dyn Logger> = match args.verbose {
        0 => Arc::new(NoOpLogger),
        1 => Arc::new(ConsoleLogger::new()),
        _ => Arc::new(ConsoleLogger::new().verbose()),
    };

    let config_file = match &args.config {
        Some(path) => FileConfigProvider::new(path, ConfigLevel::Workspace),
        None => FileConfigProvider::discover(std::env::current_dir()?),
    };
    let mut host = config_file
        .host_config()
        .with_context(|| format!("failed to load {}", config_file.path().display()))?;
    if let Some(backend) = args.backend {
        host.model.backend = backend;
    }
    if let Some(model) = args.model {
        host.model.model = model;
    }

    let connector = Arc::new(StdioConnector::new(logger.clone()));
    let pool = Arc::new(ProviderPool::new(connector, logger.clone()).with_timeouts(host.timeouts));

    if host.providers.is_empty() {
        println!("No tool providers configured in {}", config_file.path().display());
    } else {
        println!("{}", pool.start_all(&host.providers).await);
    }

    let model = create_model_backend(&host.model, logger.clone());
    let engine = ConversationEngine::new(Arc::clone(&pool), model, logger).with_config(
        EngineConfig::from_settings(&host.model, &host.timeouts, host.system_prompt.clone()),
    );

    println!(
        "Model: {}/{}. Commands: /tools, /clear, /quit",
        host.model.backend, host.model.model
    );

    let result = repl(&engine).await;
    pool.close_all().await;
    result
}

async fn repl(engine: &ConversationEngine) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<ConversationTurn> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                history.clear();
                println!("History cleared.");
                continue;
            }
            "/tools" => {
                print_tools(engine.pool());
                continue;
            }
            _ => {}
        }

        // Ctrl-C cancels the message in flight, not the program
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };
        let result = engine
            .handle_message_with_cancel(input, &history, cancel)
            .await;
        watcher.abort();

        match result {
            Ok(turns) => {
                turns.iter().for_each(print_turn);
                history.push(ConversationTurn::user(input));
                history.extend(turns);
            }
            Err(EngineError::Cancelled) => eprintln!("(cancelled)"),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}

fn print_turn(turn: &ConversationTurn) {
    match turn.metadata.as_ref().and_then(|m| m.title.as_deref()) {
        Some(title) if turn.is_tool_output() => println!("[{}]\n{}", title, turn.content),
        _ => println!("{}", turn.content),
    }
}

fn print_tools(pool: &ProviderPool) {
    let descriptors = pool.descriptors();
    if descriptors.is_empty() {
        println!("No tools available.");
        return;
    }

    for tool in descriptors {
        let owner = pool.owner_of(&tool.name).unwrap_or_default();
        println!("{:<24} {:<16} {}", tool.name, owner, tool.description);
    }
    for shadowing in pool.shadowed() {
        println!(
            "note: `{}` from {} is shadowed by {}",
            shadowing.tool, shadowing.shadowed_provider, shadowing.owner_provider
        );
    }
}
