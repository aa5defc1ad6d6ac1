// =============================================================================
// Aroon Up / Aroon Down
// =============================================================================
//
// Measures how long ago the highest high and lowest low occurred inside the
// trailing `period`-wide window:
//
//   AroonUp   = (period - 1 - barsSinceHigh) / (period - 1) * 100
//   AroonDown = (period - 1 - barsSinceLow)  / (period - 1) * 100
//
// 100 means the extreme sits on the window's right edge; 0 means it is about to
// age out.  Indices before `period - 1` are zero.
// =============================================================================

use serde::Serialize;

use super::primitives::{highest_index, lowest_index};
use crate::error::IndicatorError;

/// Aroon Up and Aroon Down series, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AroonSeries {
    pub up: Vec<f64>,
    pub down: Vec<f64>,
}

impl AroonSeries {
    pub fn is_empty(&self) -> bool {
        self.up.is_empty()
    }
}

/// Compute Aroon Up/Down over `prices`.
///
/// Returns an empty pair when `prices.len() < period`.
///
/// # Errors
/// `InvalidPeriod` when `period < 2` (the denominator `period - 1` vanishes).
pub fn aroon(period: usize, prices: &[f64]) -> Result<AroonSeries, IndicatorError> {
    if period < 2 {
        return Err(IndicatorError::invalid_period("Aroon", period));
    }
    if prices.len() < period {
        return Ok(AroonSeries::default());
    }

    let span = (period - 1) as f64;
    let mut up = vec![0.0; prices.len()];
    let mut down = vec![0.0; prices.len()];

    for (offset, window) in prices.windows(period).enumerate() {
        let i = offset + period - 1;
        // An index inside the window is also (period - 1 - barsSince).
        up[i] = highest_index(window)? as f64 / span * 100.0;
        down[i] = lowest_index(window)? as f64 / span * 100.0;
    }

    Ok(AroonSeries { up, down })
}
