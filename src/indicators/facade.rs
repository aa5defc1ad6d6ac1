// =============================================================================
// Indicator Facade
// =============================================================================
//
// One entry point grouping the indicators by capability, for callers that
// want "a trend indicator set" without knowing the individual formulas.  Each
// group is a trait object so a caller can swap in an alternative
// implementation (e.g. a cached or instrumented one) per group.
// =============================================================================

use super::aroon::{aroon, AroonSeries};
use super::atr::{average_true_range, true_range};
use super::bollinger::{bollinger_bands, BollingerSeries};
use super::ema::{dema, ema, tema, trix};
use super::macd::{macd, MacdSeries};
use super::rsi::{rsi, stoch_rsi, stoch_rsi_latest};
use super::sma::sma;
use super::supertrend::{supertrend, SuperTrendPoint};
use super::williams_r::williams_r;
use crate::error::IndicatorError;

/// Moving averages and trend-strength signals.
pub trait TrendIndicators: Send + Sync {
    fn sma(&self, prices: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
        sma(prices, period)
    }

    fn ema(&self, prices: &[f64], period: usize) -> Vec<f64> {
        ema(prices, period)
    }

    fn dema(&self, prices: &[f64], period: usize) -> Vec<f64> {
        dema(prices, period)
    }

    fn tema(&self, prices: &[f64], period: usize) -> Vec<f64> {
        tema(prices, period)
    }

    fn trix(&self, prices: &[f64], period: usize) -> Vec<f64> {
        trix(prices, period)
    }

    fn macd(
        &self,
        prices: &[f64],
        fast: usize,
        slow: usize,
        signal: usize,
    ) -> Result<MacdSeries, IndicatorError> {
        macd(prices, fast, slow, signal)
    }

    fn supertrend(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        period: usize,
        multiplier: f64,
    ) -> Result<Vec<SuperTrendPoint>, IndicatorError> {
        supertrend(high, low, close, period, multiplier)
    }

    fn true_range(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
    ) -> Result<Vec<f64>, IndicatorError> {
        true_range(high, low, close)
    }

    fn average_true_range(&self, tr: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
        average_true_range(tr, period)
    }

    fn aroon(&self, period: usize, prices: &[f64]) -> Result<AroonSeries, IndicatorError> {
        aroon(period, prices)
    }
}

/// Oscillators and volatility bands.
pub trait VolatilityIndicators: Send + Sync {
    fn rsi(&self, prices: &[f64], period: usize) -> Vec<f64> {
        rsi(prices, period)
    }

    fn stoch_rsi(
        &self,
        prices: &[f64],
        rsi_period: usize,
        stoch_period: usize,
    ) -> Result<Vec<f64>, IndicatorError> {
        stoch_rsi(prices, rsi_period, stoch_period)
    }

    fn stoch_rsi_latest(
        &self,
        prices: &[f64],
        rsi_period: usize,
        stoch_period: usize,
    ) -> Result<f64, IndicatorError> {
        stoch_rsi_latest(prices, rsi_period, stoch_period)
    }

    fn bollinger_bands(
        &self,
        prices: &[f64],
        period: usize,
        multiplier: f64,
    ) -> Result<BollingerSeries, IndicatorError> {
        bollinger_bands(prices, period, multiplier)
    }
}

/// Momentum oscillators.
pub trait MomentumIndicators: Send + Sync {
    fn williams_r(&self, prices: &[f64], period: usize) -> Vec<f64> {
        williams_r(prices, period)
    }
}

/// Stock implementation of [`TrendIndicators`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Trends;

/// Stock implementation of [`VolatilityIndicators`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Volatility;

/// Stock implementation of [`MomentumIndicators`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Momentum;

impl TrendIndicators for Trends {}
impl VolatilityIndicators for Volatility {}
impl MomentumIndicators for Momentum {}

/// The three indicator groups behind one handle.
pub struct Indicators {
    pub trends: Box<dyn TrendIndicators>,
    pub volatility: Box<dyn VolatilityIndicators>,
    pub momentum: Box<dyn MomentumIndicators>,
}

impl Indicators {
    pub fn new() -> Self {
        Self {
            trends: Box::new(Trends),
            volatility: Box::new(Volatility),
            momentum: Box::new(Momentum),
        }
    }
}

impl Default for Indicators {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Indicators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indicators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_delegates_to_free_functions() {
        let ind = Indicators::new();
        let prices: Vec<f64> = (1..=30).map(|x| x as f64 + (x as f64).sin()).collect();

        assert_eq!(ind.trends.sma(&prices, 5).unwrap(), sma(&prices, 5).unwrap());
        assert_eq!(ind.trends.ema(&prices, 5), ema(&prices, 5));
        assert_eq!(ind.volatility.rsi(&prices, 14), rsi(&prices, 14));
        assert_eq!(ind.momentum.williams_r(&prices, 14), williams_r(&prices, 14));
    }

    #[test]
    fn groups_can_be_replaced() {
        struct Frozen;
        impl MomentumIndicators for Frozen {
            fn williams_r(&self, prices: &[f64], _period: usize) -> Vec<f64> {
                vec![-50.0; prices.len()]
            }
        }

        let ind = Indicators {
            momentum: Box::new(Frozen),
            ..Indicators::new()
        };
        assert_eq!(ind.momentum.williams_r(&[1.0, 2.0], 2), vec![-50.0, -50.0]);
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let ind = Indicators::default();
        let prices: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 * 0.13).sin() * 9.0).collect();
        let a = ind.trends.trix(&prices, 6);
        let b = ind.trends.trix(&prices, 6);
        assert_eq!(
            a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        let x = ind.volatility.bollinger_bands(&prices, 20, 2.0).unwrap();
        let y = ind.volatility.bollinger_bands(&prices, 20, 2.0).unwrap();
        assert_eq!(x, y);
    }
}
