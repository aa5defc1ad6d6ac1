// =============================================================================
// Research Service
// =============================================================================
//
// One research pass fetches candles for every configured asset concurrently,
// analyses each, feeds the live trackers and records the reports in
// `AppState`.  A failing asset is logged and recorded; it never aborts the
// pass for the others.
// =============================================================================

pub mod engine;
pub mod tracker;

pub use engine::{ConditionResult, IndicatorSnapshot, ResearchEngine, ResearchReport};
pub use tracker::{LiveState, LiveTracker};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::market_data::PriceSource;

/// Outcome counts of one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    pub succeeded: usize,
    pub failed: Vec<String>,
    /// Closed candles newly fed into live trackers across all assets.
    pub candles_consumed: usize,
}

/// Run one research pass over every asset in the current config.
pub async fn run_pass<S: PriceSource>(
    state: &AppState,
    source: &S,
    engine: &ResearchEngine,
    now: DateTime<Utc>,
) -> PassSummary {
    // Snapshot the config so no lock is held across the fetches.
    let (assets, granularity, lookback) = {
        let cfg = state.config.read();
        (cfg.assets.clone(), cfg.granularity, cfg.lookback_candles)
    };

    let results = join_all(
        assets
            .iter()
            .map(|asset| engine.research(source, asset, granularity, lookback, now)),
    )
    .await;

    let mut summary = PassSummary::default();
    for (asset, result) in assets.iter().zip(results) {
        match result {
            Ok((report, candles)) => {
                match state.update_tracker(&asset.symbol, &candles, granularity, now) {
                    Ok(n) => summary.candles_consumed += n,
                    Err(e) => {
                        warn!(symbol = %asset.symbol, error = %e, "live tracker not updated");
                        state.push_error(format!("{}: tracker: {e}", asset.symbol));
                    }
                }

                info!(
                    symbol = %report.symbol,
                    candles = report.candles,
                    last_close = ?report.last_close,
                    indicators = report.snapshot.len(),
                    skipped = report.skipped.len(),
                    triggered = ?report.triggered(),
                    "research report"
                );
                state.record_report(report);
                summary.succeeded += 1;
            }
            Err(e) => {
                warn!(symbol = %asset.symbol, error = %e, "research failed");
                state.push_error(e.to_string());
                summary.failed.push(asset.symbol.clone());
            }
        }
    }

    state.increment_version();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResearchConfig;
    use crate::market_data::{Candle, CandleSeries, DataError, Granularity, Ticker};
    use chrono::TimeZone;

    struct FakeExchange;

    impl PriceSource for FakeExchange {
        async fn fetch_candles(
            &self,
            symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _granularity: Granularity,
        ) -> Result<CandleSeries, DataError> {
            if symbol == "BAD-USD" {
                return Err(DataError::unavailable(symbol, "HTTP 404"));
            }
            let bars = (0..60)
                .map(|i| Candle {
                    start: Utc.timestamp_opt(1_700_000_000 + i * 3_600, 0).unwrap(),
                    open: 50.0,
                    high: 51.0 + i as f64,
                    low: 49.0,
                    close: 50.0 + i as f64,
                    volume: 1.0,
                })
                .collect();
            Ok(CandleSeries::from_candles(symbol, bars))
        }

        async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, DataError> {
            Err(DataError::unavailable(symbol, "unused"))
        }
    }

    #[tokio::test]
    async fn pass_records_reports_and_failures() {
        let mut cfg = ResearchConfig::default();
        cfg.set_symbols("BTC-USD,BAD-USD");
        let engine = ResearchEngine::from_config(&cfg);
        let state = AppState::new(cfg);
        let now = Utc.timestamp_opt(1_800_000_000, 0).unwrap();

        let summary = run_pass(&state, &FakeExchange, &engine, now).await;
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, vec!["BAD-USD".to_string()]);
        assert_eq!(summary.candles_consumed, 60);

        let report = state.latest_report("BTC-USD").unwrap();
        assert_eq!(report.last_close, Some(109.0));
        assert!(state.latest_report("BAD-USD").is_none());
        assert_eq!(state.recent_errors.read().len(), 1);
        assert_eq!(state.live_state("BTC-USD").unwrap().observations, 60);

        // A second pass over the same candles consumes nothing new.
        let again = run_pass(&state, &FakeExchange, &engine, now).await;
        assert_eq!(again.candles_consumed, 0);
        assert!(state.current_state_version() >= 3);
    }
}
