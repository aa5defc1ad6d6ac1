// =============================================================================
// Live Tracker
// =============================================================================
//
// Keeps incremental SMA / EMA / variable-EWMA state per asset between research
// passes.  Every pass re-fetches a window of candles; the tracker feeds only
// the closed candles it has not consumed yet, identified by start time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::IndicatorSettings;
use crate::error::IndicatorError;
use crate::indicators::{RollingEma, RollingSma, VariableEwma};
use crate::market_data::{CandleSeries, Granularity};

/// Point-in-time view of a tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveState {
    pub symbol: String,
    pub observations: usize,
    pub last_start: Option<DateTime<Utc>>,
    pub last_close: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub ewma: Option<f64>,
    pub ewma_warmed_up: bool,
}

#[derive(Debug, Clone)]
pub struct LiveTracker {
    symbol: String,
    sma: RollingSma,
    ema: RollingEma,
    ewma: VariableEwma,
    last_start: Option<DateTime<Utc>>,
    last_close: Option<f64>,
}

impl LiveTracker {
    /// # Errors
    /// A zero period or an out-of-range EWMA alpha in `settings`.
    pub fn new(symbol: impl Into<String>, settings: &IndicatorSettings) -> Result<Self, IndicatorError> {
        Ok(Self {
            symbol: symbol.into(),
            sma: RollingSma::new(settings.sma_period)?,
            ema: RollingEma::with_period(settings.ema_period)?,
            ewma: VariableEwma::new(settings.ewma_alpha)?,
            last_start: None,
            last_close: None,
        })
    }

    /// Feed every candle of `candles` that closed at or before `now` and
    /// starts after the last consumed one.  Returns how many were consumed.
    pub fn update(&mut self, candles: &CandleSeries, granularity: Granularity, now: DateTime<Utc>) -> usize {
        let width = Duration::seconds(granularity.seconds());
        let mut consumed = 0;
        for candle in candles.since(self.last_start) {
            if candle.start + width > now {
                // Still forming; later candles are too.
                break;
            }
            self.sma.add(candle.close);
            self.ema.add(candle.close);
            self.ewma.add(candle.close);
            self.last_start = Some(candle.start);
            self.last_close = Some(candle.close);
            consumed += 1;
        }
        consumed
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn state(&self) -> LiveState {
        LiveState {
            symbol: self.symbol.clone(),
            observations: self.ewma.count(),
            last_start: self.last_start,
            last_close: self.last_close,
            sma: self.sma.value(),
            ema: self.ema.value(),
            ewma: self.ewma.value(),
            ewma_warmed_up: self.ewma.is_warmed_up(),
        }
    }
}
