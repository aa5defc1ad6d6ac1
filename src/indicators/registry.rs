// =============================================================================
// Indicator Registry
// =============================================================================
//
// Maps an indicator name to its capability group and a factory that computes
// it from a candle bundle.  Lets configuration and strategy conditions select
// indicators by name at runtime.
//
// Every output line is aligned with the candle series, or empty where the
// indicator defines no output for that input.  SMA, whose natural output is
// shorter, is left-padded with zeros to keep that invariant.
// =============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    aroon, average_true_range, bollinger_bands, dema, ema, macd, rsi, sma, stoch_rsi, supertrend,
    tema, trix, true_range, williams_r, Trend,
};
use crate::error::IndicatorError;
use crate::market_data::CandleSeries;

/// Capability group an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Trend,
    Volatility,
    Momentum,
}

/// Parameters accepted by the registered factories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorParams {
    /// No parameters (True Range).
    None,
    Period {
        period: usize,
    },
    Bands {
        period: usize,
        multiplier: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    StochRsi {
        rsi_period: usize,
        stoch_period: usize,
    },
}

/// Named request for one indicator, as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub name: String,
    pub params: IndicatorParams,
}

/// Named output lines of one indicator, each aligned with the input candles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorOutput {
    pub lines: Vec<(String, Vec<f64>)>,
}

impl IndicatorOutput {
    fn single(values: Vec<f64>) -> Self {
        Self {
            lines: vec![("value".to_string(), values)],
        }
    }

    fn push(mut self, name: &str, values: Vec<f64>) -> Self {
        self.lines.push((name.to_string(), values));
        self
    }

    /// The first line (`value` for single-line indicators).
    pub fn primary(&self) -> Option<&[f64]> {
        self.lines.first().map(|(_, v)| v.as_slice())
    }

    pub fn line(&self, name: &str) -> Option<&[f64]> {
        self.lines
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

/// Factory function computing an indicator from candles and parameters.
pub type IndicatorFactory = Box<
    dyn Fn(&CandleSeries, &IndicatorParams) -> Result<IndicatorOutput, IndicatorError>
        + Send
        + Sync,
>;

struct Registered {
    capability: Capability,
    factory: IndicatorFactory,
}

/// Registry of indicator factories keyed by name.
pub struct IndicatorRegistry {
    entries: HashMap<String, Registered>,
}

fn period_of(name: &str, params: &IndicatorParams) -> Result<usize, IndicatorError> {
    match params {
        IndicatorParams::Period { period } => Ok(*period),
        other => Err(IndicatorError::invalid_params(format!(
            "{name} requires period params, got {other:?}"
        ))),
    }
}

fn bands_of(name: &str, params: &IndicatorParams) -> Result<(usize, f64), IndicatorError> {
    match params {
        IndicatorParams::Bands { period, multiplier } => Ok((*period, *multiplier)),
        other => Err(IndicatorError::invalid_params(format!(
            "{name} requires bands params, got {other:?}"
        ))),
    }
}

/// Left-pad a shorter-than-input series with zeros.
fn align_right(values: Vec<f64>, len: usize) -> Vec<f64> {
    let mut out = vec![0.0; len.saturating_sub(values.len())];
    out.extend(values);
    out
}

impl IndicatorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers (or replaces) an indicator factory.
    pub fn register<F>(&mut self, name: &str, capability: Capability, factory: F)
    where
        F: Fn(&CandleSeries, &IndicatorParams) -> Result<IndicatorOutput, IndicatorError>
            + Send
            + Sync
            + 'static,
    {
        self.entries.insert(
            name.to_string(),
            Registered {
                capability,
                factory: Box::new(factory),
            },
        );
    }

    /// Computes the named indicator over `candles`.
    ///
    /// # Errors
    /// `UnknownIndicator` for unregistered names, `InvalidParams` when the
    /// parameter shape does not fit, or whatever the indicator itself reports.
    pub fn compute(
        &self,
        name: &str,
        candles: &CandleSeries,
        params: &IndicatorParams,
    ) -> Result<IndicatorOutput, IndicatorError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| IndicatorError::UnknownIndicator(name.to_string()))?;
        (entry.factory)(candles, params)
    }

    /// Computes an indicator from its configuration spec.
    ///
    /// # Errors
    /// Same as [`compute`](Self::compute).
    pub fn compute_spec(
        &self,
        spec: &IndicatorSpec,
        candles: &CandleSeries,
    ) -> Result<IndicatorOutput, IndicatorError> {
        self.compute(&spec.name, candles, &spec.params)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn capability(&self, name: &str) -> Option<Capability> {
        self.entries.get(name).map(|e| e.capability)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered names in one capability group, sorted.
    pub fn names_in(&self, capability: Capability) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, e)| e.capability == capability)
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Creates a registry with every built-in indicator registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // --- Trend -----------------------------------------------------------
        registry.register("SMA", Capability::Trend, |c, p| {
            let period = period_of("SMA", p)?;
            let values = sma(&c.close, period)?;
            Ok(IndicatorOutput::single(align_right(values, c.len())))
        });
        registry.register("EMA", Capability::Trend, |c, p| {
            Ok(IndicatorOutput::single(ema(&c.close, period_of("EMA", p)?)))
        });
        registry.register("DEMA", Capability::Trend, |c, p| {
            Ok(IndicatorOutput::single(dema(&c.close, period_of("DEMA", p)?)))
        });
        registry.register("TEMA", Capability::Trend, |c, p| {
            Ok(IndicatorOutput::single(tema(&c.close, period_of("TEMA", p)?)))
        });
        registry.register("TRIX", Capability::Trend, |c, p| {
            Ok(IndicatorOutput::single(trix(&c.close, period_of("TRIX", p)?)))
        });
        registry.register("TrueRange", Capability::Trend, |c, _| {
            Ok(IndicatorOutput::single(true_range(&c.high, &c.low, &c.close)?))
        });
        registry.register("ATR", Capability::Trend, |c, p| {
            let period = period_of("ATR", p)?;
            let tr = true_range(&c.high, &c.low, &c.close)?;
            Ok(IndicatorOutput::single(average_true_range(&tr, period)?))
        });
        registry.register("SuperTrend", Capability::Trend, |c, p| {
            let (period, multiplier) = bands_of("SuperTrend", p)?;
            let points = supertrend(&c.high, &c.low, &c.close, period, multiplier)?;
            let value = points.iter().map(|pt| pt.value).collect();
            let trend = points
                .iter()
                .map(|pt| match pt.trend {
                    Some(Trend::Up) => 1.0,
                    Some(Trend::Down) => -1.0,
                    None => 0.0,
                })
                .collect();
            Ok(IndicatorOutput::single(value).push("trend", trend))
        });
        registry.register("Aroon", Capability::Trend, |c, p| {
            let a = aroon(period_of("Aroon", p)?, &c.close)?;
            Ok(IndicatorOutput::default()
                .push("up", a.up)
                .push("down", a.down))
        });
        registry.register("MACD", Capability::Trend, |c, p| match p {
            IndicatorParams::Macd { fast, slow, signal } => {
                let m = macd(&c.close, *fast, *slow, *signal)?;
                Ok(IndicatorOutput::default()
                    .push("macd", m.macd)
                    .push("signal", m.signal)
                    .push("histogram", m.histogram))
            }
            other => Err(IndicatorError::invalid_params(format!(
                "MACD requires macd params, got {other:?}"
            ))),
        });

        // --- Volatility ------------------------------------------------------
        registry.register("RSI", Capability::Volatility, |c, p| {
            Ok(IndicatorOutput::single(rsi(&c.close, period_of("RSI", p)?)))
        });
        registry.register("StochRSI", Capability::Volatility, |c, p| match p {
            IndicatorParams::StochRsi {
                rsi_period,
                stoch_period,
            } => Ok(IndicatorOutput::single(stoch_rsi(
                &c.close,
                *rsi_period,
                *stoch_period,
            )?)),
            other => Err(IndicatorError::invalid_params(format!(
                "StochRSI requires stoch_rsi params, got {other:?}"
            ))),
        });
        registry.register("BollingerBands", Capability::Volatility, |c, p| {
            let (period, multiplier) = bands_of("BollingerBands", p)?;
            let bb = bollinger_bands(&c.close, period, multiplier)?;
            Ok(IndicatorOutput::default()
                .push("middle", bb.middle)
                .push("upper", bb.upper)
                .push("lower", bb.lower))
        });

        // --- Momentum --------------------------------------------------------
        registry.register("WilliamsR", Capability::Momentum, |c, p| {
            Ok(IndicatorOutput::single(williams_r(
                &c.close,
                period_of("WilliamsR", p)?,
            )))
        });

        registry
    }
}

impl Default for IndicatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
