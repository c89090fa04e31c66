mod config;
mod console;
mod driver;
mod error;
mod indicator;
mod model;
mod portfolio;
mod predictor;
mod render;
mod signal;
mod source;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use driver::{AppState, Command, DriverSettings, RefreshDriver};
use portfolio::Portfolio;
use predictor::LinearPredictor;
use render::Renderer;
use render::terminal::TerminalRenderer;
use source::PriceSource;
use source::coingecko::CoinGeckoSource;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "coin-signal", about = "Crypto buy/sell/hold signals with a simulated balance")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Asset to select at start-up (overrides `trading.asset`)
    #[arg(short, long)]
    asset: Option<String>,

    /// Trading style, `day` or `swing` (overrides `trading.style`)
    #[arg(short, long)]
    style: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let mut config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    if let Some(asset) = cli.asset {
        config.trading.asset = asset.to_ascii_lowercase();
    }
    if let Some(style) = cli.style {
        config.trading.style = style;
    }
    config::validate(&config)
        .change_context(AppError::Config)
        .attach("after applying command-line overrides")?;

    init_tracing(&config);

    // ── Collaborators ─────────────────────────────────────────────────────────
    let source: Arc<dyn PriceSource> = Arc::new(CoinGeckoSource::new(
        &config.source.base_url,
        &config.source.vs_currency,
        config.source.requests_per_minute,
    ));
    let renderer: Arc<dyn Renderer> = Arc::new(TerminalRenderer);

    // ── Driver ────────────────────────────────────────────────────────────────
    let state = AppState::new(
        &config.trading.asset,
        config.trading.trading_style(),
        Portfolio::new(config.trading.starting_balance),
    );
    let settings = DriverSettings {
        refresh_interval: Duration::from_secs(config.refresh.interval_secs),
        history_days: config.source.history_days,
    };
    let driver = RefreshDriver::new(
        source,
        renderer,
        Box::new(LinearPredictor::new()),
        settings,
        state,
    );

    let cancel = CancellationToken::new();
    let (command_tx, command_rx) = mpsc::channel::<Command>(64);

    let driver_handle = tokio::spawn(driver.run(command_rx, cancel.clone()));
    console::spawn_reader(config.trading.assets.clone(), command_tx, cancel.clone())
        .change_context(AppError::Runtime)
        .attach("failed to start the console reader")?;

    // ── Shutdown ──────────────────────────────────────────────────────────────
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.change_context(AppError::Runtime)?;
            info!("ctrl+c received, shutting down");
        }
        _ = cancel.cancelled() => info!("quit requested, shutting down"),
    }
    cancel.cancel();

    if tokio::time::timeout(Duration::from_secs(5), driver_handle)
        .await
        .is_err()
    {
        warn!("driver did not stop within 5s");
    }

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
