// =============================================================================
// recon: Research Loop Entry Point
// =============================================================================
//
// Polls every configured asset on the research interval, logs indicator
// snapshots and triggered conditions, and keeps live trackers warm.
// =============================================================================

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use recon_ta::app_state::AppState;
use recon_ta::coinbase::CoinbaseClient;
use recon_ta::config::{env, ResearchConfig, DEFAULT_CONFIG_PATH};
use recon_ta::market_data::PriceSource;
use recon_ta::research::{self, ResearchEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("recon starting up");

    let config_path = env::get_string("RECON_CONFIG", DEFAULT_CONFIG_PATH);
    let loaded = ResearchConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ResearchConfig::default()
    });
    let config = loaded.with_env_overrides();
    config.validate()?;

    info!(
        symbols = ?config.symbols(),
        granularity = %config.granularity,
        interval_secs = config.research_interval_secs,
        conditions = config.conditions.len(),
        "Configured research"
    );

    // ── 2. Shared state, engine, client ──────────────────────────────────
    let engine = Arc::new(ResearchEngine::from_config(&config));
    let interval_secs = config.research_interval_secs;
    let state = Arc::new(AppState::new(config));
    let client = Arc::new(CoinbaseClient::from_env()?);
    info!(signed = client.is_signed(), "Coinbase client ready");

    // ── 3. Startup ticker check ──────────────────────────────────────────
    let symbols: Vec<String> = state
        .config
        .read()
        .symbols()
        .into_iter()
        .map(str::to_string)
        .collect();
    let tickers = join_all(symbols.iter().map(|s| client.fetch_ticker(s))).await;
    for (symbol, ticker) in symbols.iter().zip(tickers) {
        match ticker {
            Ok(t) => info!(symbol = %t.symbol, price = t.price, change_24h_pct = t.price_change_24h_pct, "ticker"),
            Err(e) => warn!(symbol = %symbol, error = %e, "ticker unavailable"),
        }
    }

    // ── 4. Research loop ─────────────────────────────────────────────────
    let loop_state = state.clone();
    let loop_client = client.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let summary = research::run_pass(
                &loop_state,
                loop_client.as_ref(),
                &engine,
                chrono::Utc::now(),
            )
            .await;
            info!(
                succeeded = summary.succeeded,
                failed = ?summary.failed,
                new_candles = summary.candles_consumed,
                version = loop_state.current_state_version(),
                "research pass complete"
            );
        }
    });

    info!("Research loop running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!(uptime_secs = state.uptime_secs(), "Shutdown signal received, stopping");

    // Saved as loaded: environment overrides are per-run.
    if let Err(e) = loaded.save(&config_path) {
        error!(error = %e, "Failed to save research config on shutdown");
    }

    info!("recon shut down complete.");
    Ok(())
}
