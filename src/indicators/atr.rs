// =============================================================================
// True Range & Average True Range (ATR): Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar after the first:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
// Bar 0 has no previous close and its TR is zero.
//
// ATR smooths TR with Wilder's method:
//   ATR_period = mean(TR_1 ..= TR_period)
//   ATR_t      = (ATR_{t-1} * (period - 1) + TR_t) / period
// Indices before `period` are zero.
// =============================================================================

use crate::error::{check_aligned, IndicatorError};

/// Compute the True Range series from aligned high/low/close series.
///
/// # Errors
/// `MisalignedSeries` when the three series differ in length.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, IndicatorError> {
    check_aligned(close.len(), &[high.len(), low.len()])?;

    let mut tr = vec![0.0; close.len()];
    for i in 1..close.len() {
        let prev_close = close[i - 1];
        let hl = high[i] - low[i];
        let hc = (high[i] - prev_close).abs();
        let lc = (low[i] - prev_close).abs();
        tr[i] = hl.max(hc).max(lc);
    }
    Ok(tr)
}

/// Compute the ATR series from a True Range series (as produced by
/// [`true_range`], so index 0 is ignored).
///
/// # Errors
/// - `InvalidPeriod` when `period == 0`
/// - `InsufficientData` when fewer than `period + 1` TR values are supplied
pub fn average_true_range(tr: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::invalid_period("ATR", period));
    }
    if tr.len() < period + 1 {
        return Err(IndicatorError::insufficient(period + 1, tr.len()));
    }

    let period_f = period as f64;
    let mut atr = vec![0.0; tr.len()];
    atr[period] = tr[1..=period].iter().sum::<f64>() / period_f;

    for i in period + 1..tr.len() {
        atr[i] = (atr[i - 1] * (period_f - 1.0) + tr[i]) / period_f;
    }
    Ok(atr)
}
