// =============================================================================
// Relative Strength Index (RSI) & Stochastic RSI: Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes.
//
// Step 1: Seed average gain / average loss from the deltas inside the first
//          `period` closes (deltas 1..period), each sum divided by `period`.
// Step 2: First RSI sits at index `period - 1`.
// Step 3: Apply Wilder's smoothing for every later close:
//            avg_gain = (prev_avg_gain * (period - 1) + gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + loss) / period
// Step 4: RS  = avg_gain / avg_loss   (RS = 0 when avg_loss == 0)
//          RSI = 100 - 100 / (1 + RS)
//
// Stochastic RSI applies the stochastic oscillator to the RSI series:
//   StochRSI = (RSI - min(RSI, n)) / (max(RSI, n) - min(RSI, n)) * 100
// and reports 100 for a flat RSI window.
// =============================================================================

use super::primitives::{highest, lowest};
use crate::error::IndicatorError;

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss != 0.0 { avg_gain / avg_loss } else { 0.0 };
    100.0 - 100.0 / (1.0 + rs)
}

/// Compute the full RSI series for `prices` and `period`.
///
/// The output is aligned with the input; indices before `period - 1` are zero.
///
/// # Edge cases
/// - `period == 0` or `prices.len() < period` => empty vec
/// - no losses in the smoothing window => RS treated as 0 (RSI 0), never infinity
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let period_f = period as f64;
    let mut out = vec![0.0; prices.len()];

    // --- Seed averages -------------------------------------------------------
    let (gain_sum, loss_sum) = prices[..period]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d >= 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
    let mut avg_gain = gain_sum / period_f;
    let mut avg_loss = loss_sum / period_f;
    out[period - 1] = rsi_from_averages(avg_gain, avg_loss);

    // --- Wilder's smoothing --------------------------------------------------
    for i in period..prices.len() {
        let delta = prices[i] - prices[i - 1];
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        out[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

/// Compute the aligned Stochastic RSI series.
///
/// Index `i` is defined once the trailing `stoch_period` RSI values are all
/// past the RSI warm-up, i.e. from `rsi_period + stoch_period - 2`; earlier
/// indices are zero.
///
/// # Errors
/// - `InvalidPeriod` when either period is zero
/// - `InsufficientData` when `prices.len() < rsi_period + stoch_period`
pub fn stoch_rsi(
    prices: &[f64],
    rsi_period: usize,
    stoch_period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    if rsi_period == 0 {
        return Err(IndicatorError::invalid_period("StochRSI", rsi_period));
    }
    if stoch_period == 0 {
        return Err(IndicatorError::invalid_period("StochRSI", stoch_period));
    }
    let required = rsi_period + stoch_period;
    if prices.len() < required {
        return Err(IndicatorError::insufficient(required, prices.len()));
    }

    let rsi_values = rsi(prices, rsi_period);
    let first = rsi_period + stoch_period - 2;
    let mut out = vec![0.0; prices.len()];

    for i in first..prices.len() {
        let window = &rsi_values[i + 1 - stoch_period..=i];
        let hi = highest(window)?;
        let lo = lowest(window)?;
        out[i] = if hi == lo {
            100.0
        } else {
            (rsi_values[i] - lo) / (hi - lo) * 100.0
        };
    }

    Ok(out)
}

/// Stochastic RSI of the most recent close.
///
/// # Errors
/// Same as [`stoch_rsi`].
pub fn stoch_rsi_latest(
    prices: &[f64],
    rsi_period: usize,
    stoch_period: usize,
) -> Result<f64, IndicatorError> {
    let series = stoch_rsi(prices, rsi_period, stoch_period)?;
    series
        .last()
        .copied()
        .ok_or_else(|| IndicatorError::insufficient(rsi_period + stoch_period, 0))
}
