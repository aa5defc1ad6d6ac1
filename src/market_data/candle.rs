use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{check_aligned, IndicatorError};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub start: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Column-oriented candles for one asset, oldest first.
///
/// Every column has the same length; indicator functions take the columns
/// directly as price series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub start: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Build a series from candles in any order.  Candles are sorted by start
    /// time and duplicates of the same start keep the last one seen.
    pub fn from_candles(symbol: impl Into<String>, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.start);
        let mut series = Self::new(symbol);
        for candle in candles {
            if series.start.last() == Some(&candle.start) {
                series.pop();
            }
            series.push(candle);
        }
        series
    }

    pub fn push(&mut self, candle: Candle) {
        self.start.push(candle.start);
        self.open.push(candle.open);
        self.high.push(candle.high);
        self.low.push(candle.low);
        self.close.push(candle.close);
        self.volume.push(candle.volume);
    }

    fn pop(&mut self) {
        self.start.pop();
        self.open.pop();
        self.high.pop();
        self.low.pop();
        self.close.pop();
        self.volume.pop();
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Row `i` as a [`Candle`].
    pub fn get(&self, i: usize) -> Option<Candle> {
        Some(Candle {
            start: *self.start.get(i)?,
            open: *self.open.get(i)?,
            high: *self.high.get(i)?,
            low: *self.low.get(i)?,
            close: *self.close.get(i)?,
            volume: *self.volume.get(i)?,
        })
    }

    pub fn last(&self) -> Option<Candle> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Check that every column is aligned with `close`.
    ///
    /// # Errors
    /// `MisalignedSeries` naming the first column of the wrong length.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_aligned(
            self.close.len(),
            &[
                self.start.len(),
                self.open.len(),
                self.high.len(),
                self.low.len(),
                self.volume.len(),
            ],
        )
    }

    /// Candles strictly after `after`, oldest first.
    pub fn since(&self, after: Option<DateTime<Utc>>) -> impl Iterator<Item = Candle> + '_ {
        (0..self.len())
            .filter(move |&i| after.map_or(true, |t| self.start[i] > t))
            .filter_map(|i| self.get(i))
    }
}

/// Latest product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    pub volume_24h: f64,
    pub price_change_24h_pct: f64,
}
