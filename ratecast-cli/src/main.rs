//! Ratecast CLI
//!
//! Runs the HTTP service and offers a couple of operator commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ratecast_api::{ApiServer, AppConfig, AppState};
use ratecast_core::traits::RateSource;
use ratecast_mailer::SmtpMailer;
use ratecast_rates::{CoinGeckoClient, RatesConfig};
use ratecast_registry::FileRegistry;

/// Ratecast - Bitcoin rate quotes and subscriber broadcasts
#[derive(Parser)]
#[command(name = "ratecast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Directory holding config.json and its mode/local overlays
        #[arg(short, long, default_value = "conf", env = "CONFIG_DIR")]
        config_dir: PathBuf,
        /// Listen address, overrides the configured one
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Fetch and print the current BTC/USD rate
    Rate {
        /// Rate API root
        #[arg(long, env = "RATES_BASE_URL")]
        base_url: Option<String>,
    },

    /// Print the subscriber list in acceptance order
    Subscribers {
        /// Subscriber file (defaults to the configured path)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Directory holding config.json and its mode/local overlays
        #[arg(short, long, default_value = "conf", env = "CONFIG_DIR")]
        config_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config_dir, bind } => cmd_serve(&config_dir, bind, cli.verbose).await,
        Commands::Rate { base_url } => {
            init_logging(cli.verbose, false);
            cmd_rate(base_url).await
        }
        Commands::Subscribers { file, config_dir } => {
            init_logging(cli.verbose, false);
            cmd_subscribers(file, &config_dir).await
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "ratecast=debug,info"
    } else {
        "ratecast=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Run the API server until Ctrl-C
async fn cmd_serve(config_dir: &Path, bind: Option<String>, verbose: bool) -> Result<()> {
    let mut config = AppConfig::load(config_dir).context("Failed to load configuration")?;
    if let Some(bind) = bind {
        config.bind = bind;
    }

    init_logging(verbose, config.json_logs);

    info!(path = %config.subscribers_path.display(), "Reading subscribers");
    if let Some(parent) = config.subscribers_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let registry = Arc::new(
        FileRegistry::open(&config.subscribers_path)
            .await
            .context("Failed to read subscribers")?,
    );

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to listen on {}", config.bind))?;

    let mailer = SmtpMailer::new(&config.smtp).context("Failed to create mailer")?;
    let rates = CoinGeckoClient::with_config(config.rates.clone())
        .context("Failed to create rate source")?;

    let server = ApiServer::new(AppState::new(
        registry.clone(),
        Arc::new(rates),
        Arc::new(mailer),
    ));

    server
        .serve(listener, shutdown_signal())
        .await
        .context("API server failed")?;

    registry.close().await.context("Failed to close registry")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

/// Print the current rate
async fn cmd_rate(base_url: Option<String>) -> Result<()> {
    let config = match base_url {
        Some(url) => RatesConfig::with_base_url(url),
        None => RatesConfig::default(),
    };

    let client = CoinGeckoClient::with_config(config).context("Failed to create rate source")?;
    let rate = client.fetch_rate().await.context("Failed to fetch exchange rate")?;

    println!("{} {} USD", "₿ Bitcoin rate:".cyan().bold(), rate.to_string().green());
    Ok(())
}

/// Print the subscriber list
async fn cmd_subscribers(file: Option<PathBuf>, config_dir: &Path) -> Result<()> {
    let path = match file {
        Some(path) => path,
        None => {
            AppConfig::load(config_dir)
                .context("Failed to load configuration")?
                .subscribers_path
        }
    };

    if !path.exists() {
        println!("{} {}", "No subscriber file at".yellow(), path.display());
        return Ok(());
    }

    let registry = FileRegistry::open(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let subscribers = registry.list();
    registry.close().await.context("Failed to close registry")?;

    println!(
        "{} {}",
        "📬 Subscribers:".cyan().bold(),
        subscribers.len().to_string().green()
    );
    for email in &subscribers {
        println!("   {}", email);
    }

    Ok(())
}
