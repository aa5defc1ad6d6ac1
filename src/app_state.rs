// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by the research loop and the shutdown path via `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
//   - Guards are never held across an await point.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::ResearchConfig;
use crate::error::IndicatorError;
use crate::market_data::{CandleSeries, Granularity};
use crate::research::{LiveState, LiveTracker, ResearchReport};

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub at: DateTime<Utc>,
}

pub struct AppState {
    /// Incremented after every research pass.
    pub state_version: AtomicU64,

    pub config: Arc<RwLock<ResearchConfig>>,

    /// Live accumulators per symbol, created on first use.
    pub trackers: RwLock<HashMap<String, LiveTracker>>,
    /// Most recent report per symbol.
    pub reports: RwLock<HashMap<String, ResearchReport>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: ResearchConfig) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            config: Arc::new(RwLock::new(config)),
            trackers: RwLock::new(HashMap::new()),
            reports: RwLock::new(HashMap::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Record an error, keeping only the newest [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, message: String) {
        let mut errors = self.recent_errors.write();
        errors.push(ErrorRecord {
            message,
            at: Utc::now(),
        });
        if errors.len() > MAX_RECENT_ERRORS {
            let excess = errors.len() - MAX_RECENT_ERRORS;
            errors.drain(..excess);
        }
    }

    pub fn record_report(&self, report: ResearchReport) {
        self.reports.write().insert(report.symbol.clone(), report);
    }

    pub fn latest_report(&self, symbol: &str) -> Option<ResearchReport> {
        self.reports.read().get(symbol).cloned()
    }

    /// Feed `candles` into the symbol's live tracker, creating it from the
    /// current indicator settings on first use.
    pub fn update_tracker(
        &self,
        symbol: &str,
        candles: &CandleSeries,
        granularity: Granularity,
        now: DateTime<Utc>,
    ) -> Result<usize, IndicatorError> {
        let settings = self.config.read().indicators.clone();
        let mut trackers = self.trackers.write();
        let tracker = match trackers.entry(symbol.to_string()) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => e.insert(LiveTracker::new(symbol, &settings)?),
        };
        Ok(tracker.update(candles, granularity, now))
    }

    pub fn live_state(&self, symbol: &str) -> Option<LiveState> {
        self.trackers.read().get(symbol).map(LiveTracker::state)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_log_is_bounded() {
        let state = AppState::new(ResearchConfig::default());
        for i in 0..(MAX_RECENT_ERRORS + 5) {
            state.push_error(format!("error {i}"));
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "error 5");
    }

    #[test]
    fn version_increments() {
        let state = AppState::new(ResearchConfig::default());
        assert_eq!(state.current_state_version(), 1);
        assert_eq!(state.increment_version(), 2);
        assert_eq!(state.current_state_version(), 2);
    }

    #[test]
    fn tracker_creation_surfaces_bad_settings() {
        let mut cfg = ResearchConfig::default();
        cfg.indicators.sma_period = 0;
        let state = AppState::new(cfg);
        let result = state.update_tracker(
            "BTC-USD",
            &CandleSeries::new("BTC-USD"),
            Granularity::OneHour,
            Utc::now(),
        );
        assert!(result.is_err());
        assert!(state.live_state("BTC-USD").is_none());
    }
}
