use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agentnet_builder::BuilderSession;
use agentnet_client::{ConnectionClient, HttpBackend};
use agentnet_core::config::AppConfig;
use agentnet_core::event::EventBus;

const DEFAULT_CONFIG: &str = "agentnet.toml";
const DEFAULT_LOG_FILE: &str = "agentnet.log";
const DEFAULT_FILTER: &str = "agentnet=info,warn";

#[derive(Parser)]
#[command(name = "agentnet", version, about = "AI agent network builder")]
struct Cli {
    /// Path to config file [default: agentnet.toml]
    #[arg(short, long, env = "AGENTNET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal builder (default)
    Tui,
    /// Print the message transcript as it arrives
    Watch,
    /// Show the resolved configuration
    Config,
}

fn init_tracing(config: &AppConfig, to_file: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    });

    if to_file {
        let path = config.log.file.as_deref().unwrap_or(DEFAULT_LOG_FILE);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn session_for(config: &AppConfig) -> anyhow::Result<BuilderSession> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    Ok(BuilderSession::new(&config.builder, backend, EventBus::default()))
}

async fn watch(config: &AppConfig) -> anyhow::Result<()> {
    let mut session = session_for(config)?;
    let mut printed = 0;
    print_new_entries(&session, &mut printed);

    let mut client = ConnectionClient::open(config.backend.push_url.clone());
    loop {
        tokio::select! {
            event = client.recv() => match event {
                Some(event) => {
                    session.apply_push(event);
                    print_new_entries(&session, &mut printed);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    client.close().await;
    Ok(())
}

fn print_new_entries(session: &BuilderSession, printed: &mut usize) {
    for entry in &session.log().entries()[*printed..] {
        println!(
            "[{}] {} → {}: {}",
            entry.time_label(),
            entry.from,
            entry.to,
            entry.message
        );
    }
    *printed = session.log().len();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = AppConfig::load_or_default(&config_path, explicit)?;

    let command = cli.command.unwrap_or(Commands::Tui);
    init_tracing(&config, matches!(command, Commands::Tui))?;
    info!(config = %config_path.display(), backend = %config.backend.base_url, "Starting");

    match command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Watch => {
            watch(&config).await?;
        }
        Commands::Tui => {
            let session = session_for(&config)?;
            let client = ConnectionClient::open(config.backend.push_url.clone());
            agentnet_tui::run_tui(session, Some(client)).await?;
        }
    }

    Ok(())
}
