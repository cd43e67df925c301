use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use tokio::sync::mpsc;

use newsdesk::api::ApiClient;
use newsdesk::app::{App, AppEvent};
use newsdesk::config::Config;
use newsdesk::storage::{Database, DatabaseError};
use newsdesk::ui;

/// Get the config directory path (~/.config/newsdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdesk"))
}

#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    about = "Terminal client for a news scraping and article generation service"
)]
struct Args {
    /// Config file (defaults to ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Service root URL, overriding the config file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Delete the saved API key and exit
    #[arg(long)]
    forget_key: bool,
}

/// Logs go to a file: stdout belongs to the terminal UI.
fn init_logging(config_dir: &std::path::Path) -> Result<()> {
    let log_path = config_dir.join("newsdesk.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newsdesk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    init_logging(&config_dir)?;

    // The directory holds the database with the saved API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let db_path = config_dir.join("newsdesk.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(e @ DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    if args.forget_key {
        let removed = db
            .forget_api_key()
            .await
            .context("Failed to delete saved API key")?;
        if removed {
            println!("Saved API key deleted.");
        } else {
            println!("No saved API key.");
        }
        return Ok(());
    }

    // A key saved from the UI wins over the config file.
    let api_key = match db.load_api_key().await {
        Ok(Some(key)) => Some(key),
        Ok(None) => config.api_key.clone().map(SecretString::from),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load saved API key");
            config.api_key.clone().map(SecretString::from)
        }
    };

    let api = ApiClient::new(&config.base_url)
        .with_context(|| format!("Invalid service URL '{}'", config.base_url))?;
    tracing::info!(base_url = %config.base_url, has_key = api_key.is_some(), "Starting newsdesk");

    let mut app = App::new(db, api, &config, api_key);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
