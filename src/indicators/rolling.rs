// =============================================================================
// Incremental Accumulators: RollingSma, RollingEma, VariableEwma
// =============================================================================
//
// Update an indicator one observation at a time as new candles close, without
// recomputing the whole history.
//
// Contract shared by every accumulator:
//   - `add` never fails
//   - `value()` is `None` until the first `add`
//   - one instance serves one stream; there is no internal locking, so callers
//     that update from several tasks must serialise access per instance
// =============================================================================

use std::collections::VecDeque;

use crate::error::IndicatorError;

/// Observations echoed verbatim by [`VariableEwma`] before blending starts.
pub const EWMA_WARM_UP: usize = 10;

fn check_alpha(alpha: f64) -> Result<f64, IndicatorError> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(alpha)
    } else {
        Err(IndicatorError::InvalidSmoothing(alpha))
    }
}

// =============================================================================
// RollingSma
// =============================================================================

/// Simple moving average over the most recent `window` observations.
///
/// The mean is recomputed from every retained value on each `add` (O(window)).
#[derive(Debug, Clone)]
pub struct RollingSma {
    values: VecDeque<f64>,
    window: usize,
    average: Option<f64>,
}

impl RollingSma {
    /// # Errors
    /// `InvalidPeriod` when `window == 0`.
    pub fn new(window: usize) -> Result<Self, IndicatorError> {
        if window == 0 {
            return Err(IndicatorError::invalid_period("RollingSMA", window));
        }
        Ok(Self {
            values: VecDeque::with_capacity(window),
            window,
            average: None,
        })
    }

    /// Build an accumulator already primed with the tail of `history`.
    ///
    /// # Errors
    /// `InvalidPeriod` when `window == 0`.
    pub fn from_history(history: &[f64], window: usize) -> Result<Self, IndicatorError> {
        let mut sma = Self::new(window)?;
        let start = history.len().saturating_sub(window);
        for &v in &history[start..] {
            sma.add(v);
        }
        Ok(sma)
    }

    pub fn add(&mut self, value: f64) {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.average = Some(self.values.iter().sum::<f64>() / self.values.len() as f64);
    }

    pub fn value(&self) -> Option<f64> {
        self.average
    }

    /// `true` once `window` observations are retained.
    pub fn is_full(&self) -> bool {
        self.values.len() == self.window
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// RollingEma
// =============================================================================

/// Exponentially weighted running average with an observation count.
///
/// The first observation seeds the average; later ones move it by `alpha`
/// of the distance to the new value:
///
///   average += (value - average) * alpha
///
/// This is a true EMA, not a `sum / count` running mean: after `10, 20, 30`
/// with `alpha = 0.5` it reads 22.5 where the mean would be 20.
#[derive(Debug, Clone)]
pub struct RollingEma {
    alpha: f64,
    average: f64,
    count: usize,
}

impl RollingEma {
    /// # Errors
    /// `InvalidSmoothing` when `alpha` is outside `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self, IndicatorError> {
        Ok(Self {
            alpha: check_alpha(alpha)?,
            average: 0.0,
            count: 0,
        })
    }

    /// EMA with the conventional `2 / (period + 1)` smoothing.
    ///
    /// # Errors
    /// `InvalidPeriod` when `period == 0`.
    pub fn with_period(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::invalid_period("RollingEMA", period));
        }
        Self::new(super::ema::smoothing(period))
    }

    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.average = value;
        } else {
            self.average += (value - self.average) * self.alpha;
        }
        self.count += 1;
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.average)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

// =============================================================================
// VariableEwma
// =============================================================================

/// EWMA that echoes raw values during a fixed warm-up of
/// [`EWMA_WARM_UP`] observations, then blends `value*α + previous*(1-α)`.
#[derive(Debug, Clone)]
pub struct VariableEwma {
    alpha: f64,
    current: f64,
    count: usize,
}

impl VariableEwma {
    /// # Errors
    /// `InvalidSmoothing` when `alpha` is outside `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self, IndicatorError> {
        Ok(Self {
            alpha: check_alpha(alpha)?,
            current: 0.0,
            count: 0,
        })
    }

    pub fn add(&mut self, value: f64) {
        self.current = if self.count < EWMA_WARM_UP {
            value
        } else {
            value * self.alpha + self.current * (1.0 - self.alpha)
        };
        self.count += 1;
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.current)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `true` once blending has started.
    pub fn is_warmed_up(&self) -> bool {
        self.count > EWMA_WARM_UP
    }
}

/// Batch form of [`VariableEwma`]: one output per input, aligned.
///
/// # Errors
/// `InvalidSmoothing` when `alpha` is outside `(0, 1]`.
pub fn variable_ewma(prices: &[f64], alpha: f64) -> Result<Vec<f64>, IndicatorError> {
    let mut ewma = VariableEwma::new(alpha)?;
    Ok(prices
        .iter()
        .map(|&p| {
            ewma.add(p);
            ewma.current
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- RollingSma ------------------------------------------------------

    #[test]
    fn sma_empty_has_no_value() {
        let sma = RollingSma::new(3).unwrap();
        assert_eq!(sma.value(), None);
        assert!(sma.is_empty());
    }

    #[test]
    fn sma_zero_window_rejected() {
        assert!(RollingSma::new(0).is_err());
    }

    #[test]
    fn sma_slides_over_window() {
        let mut sma = RollingSma::new(3).unwrap();
        sma.add(1.0);
        assert_eq!(sma.value(), Some(1.0));
        sma.add(2.0);
        assert_eq!(sma.value(), Some(1.5));
        assert!(!sma.is_full());
        sma.add(3.0);
        assert_eq!(sma.value(), Some(2.0));
        sma.add(4.0);
        assert_eq!(sma.value(), Some(3.0));
        assert_eq!(sma.len(), 3);
    }

    #[test]
    fn sma_matches_batch_sma() {
        let prices: Vec<f64> = (0..30).map(|i| (i as f64 * 0.4).sin() * 7.0 + 30.0).collect();
        let batch = crate::indicators::sma::sma(&prices, 5).unwrap();
        let mut rolling = RollingSma::from_history(&prices[..5], 5).unwrap();
        assert!((rolling.value().unwrap() - batch[0]).abs() < 1e-12);
        for (j, &p) in prices[5..].iter().enumerate() {
            rolling.add(p);
            assert!((rolling.value().unwrap() - batch[j + 1]).abs() < 1e-12);
        }
    }

    #[test]
    fn sma_from_short_history() {
        let sma = RollingSma::from_history(&[4.0, 8.0], 5).unwrap();
        assert_eq!(sma.value(), Some(6.0));
        assert_eq!(sma.len(), 2);
    }

    // ---- RollingEma ------------------------------------------------------

    #[test]
    fn ema_rejects_bad_alpha() {
        assert!(RollingEma::new(0.0).is_err());
        assert!(RollingEma::new(1.5).is_err());
        assert!(RollingEma::new(f64::NAN).is_err());
        assert!(RollingEma::with_period(0).is_err());
    }

    #[test]
    fn ema_first_value_seeds() {
        let mut ema = RollingEma::new(0.5).unwrap();
        assert_eq!(ema.value(), None);
        ema.add(10.0);
        assert_eq!(ema.value(), Some(10.0));
        ema.add(20.0);
        assert_eq!(ema.value(), Some(15.0));
        assert_eq!(ema.count(), 2);
    }

    #[test]
    fn ema_weights_recent_values_not_a_running_mean() {
        let mut ema = RollingEma::new(0.5).unwrap();
        for v in [10.0, 20.0, 30.0] {
            ema.add(v);
        }
        assert_eq!(ema.value(), Some(22.5));
        assert_eq!(ema.count(), 3);

        let mut full = RollingEma::new(1.0).unwrap();
        full.add(10.0);
        full.add(30.0);
        assert_eq!(full.value(), Some(30.0));
    }

    #[test]
    fn ema_with_period_uses_standard_alpha() {
        let ema = RollingEma::with_period(9).unwrap();
        assert!((ema.alpha() - 0.2).abs() < 1e-12);
    }

    // ---- VariableEwma ----------------------------------------------------

    #[test]
    fn ewma_echoes_during_warm_up() {
        let mut ewma = VariableEwma::new(0.3).unwrap();
        assert_eq!(ewma.value(), None);
        for i in 0..EWMA_WARM_UP {
            ewma.add(i as f64);
            assert_eq!(ewma.value(), Some(i as f64));
        }
        assert!(!ewma.is_warmed_up());
        ewma.add(100.0);
        let expected = 100.0 * 0.3 + 9.0 * 0.7;
        assert!((ewma.value().unwrap() - expected).abs() < 1e-12);
        assert!(ewma.is_warmed_up());
    }

    #[test]
    fn batch_ewma_matches_incremental() {
        let prices: Vec<f64> = (0..25).map(|i| i as f64 * 1.5).collect();
        let batch = variable_ewma(&prices, 0.2).unwrap();
        let mut ewma = VariableEwma::new(0.2).unwrap();
        assert_eq!(batch.len(), prices.len());
        for (i, &p) in prices.iter().enumerate() {
            ewma.add(p);
            assert_eq!(ewma.value(), Some(batch[i]));
        }
    }
}
