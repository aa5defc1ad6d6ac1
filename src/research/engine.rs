// =============================================================================
// Research Engine
// =============================================================================
//
// Computes every configured indicator over an asset's candles, collects the
// latest value of each line into an `IndicatorSnapshot`, and evaluates the
// configured conditions at the most recent candle.
//
// Indicators that cannot be computed (usually too few candles) are reported
// in `skipped` and left out of the frame; conditions that reference them
// report the error instead of a verdict.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{AssetConfig, Assumption, IndicatorSettings, ResearchConfig};
use crate::indicators::{IndicatorRegistry, IndicatorSpec};
use crate::market_data::{CandleSeries, DataError, Granularity, PriceSource};
use crate::strategy::{IndicatorFrame, NamedCondition};

/// Raw candle columns available to conditions alongside the indicators.
const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

// =============================================================================
// Report types
// =============================================================================

/// Latest value of every computed indicator line, keyed as in the frame
/// (`RSI`, `MACD.signal`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub values: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of one configured condition at the latest candle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionResult {
    pub name: String,
    pub expression: String,
    /// `None` when evaluation failed; see `error`.
    pub holds: Option<bool>,
    pub error: Option<String>,
}

/// One research pass over one asset.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub candles: usize,
    pub last_candle_start: Option<DateTime<Utc>>,
    pub last_close: Option<f64>,
    pub snapshot: IndicatorSnapshot,
    pub conditions: Vec<ConditionResult>,
    /// Indicators that could not be computed, with the reason.
    pub skipped: Vec<(String, String)>,
    pub assumptions: Vec<Assumption>,
}

impl ResearchReport {
    /// Names of the conditions that hold.
    pub fn triggered(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|c| c.holds == Some(true))
            .map(|c| c.name.as_str())
            .collect()
    }
}

// =============================================================================
// ResearchEngine
// =============================================================================

pub struct ResearchEngine {
    registry: IndicatorRegistry,
    specs: Vec<IndicatorSpec>,
    conditions: Vec<NamedCondition>,
}

impl ResearchEngine {
    pub fn new(
        registry: IndicatorRegistry,
        settings: &IndicatorSettings,
        conditions: Vec<NamedCondition>,
    ) -> Self {
        Self {
            registry,
            specs: settings.specs(),
            conditions,
        }
    }

    /// Engine with the built-in registry and the config's settings and
    /// conditions.
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(
            IndicatorRegistry::with_defaults(),
            &config.indicators,
            config.conditions.clone(),
        )
    }

    /// Frame holding the price columns and every computable indicator line.
    /// Returns the frame and the indicators that were skipped.
    pub fn build_frame(&self, candles: &CandleSeries) -> (IndicatorFrame, Vec<(String, String)>) {
        let mut frame = IndicatorFrame::new(candles.len());
        let mut skipped = Vec::new();

        let columns = [&candles.open, &candles.high, &candles.low, &candles.close, &candles.volume];
        for (name, column) in PRICE_COLUMNS.iter().zip(columns) {
            if let Err(e) = frame.insert(*name, column.clone()) {
                skipped.push((name.to_string(), e.to_string()));
            }
        }

        for spec in &self.specs {
            let result = self
                .registry
                .compute_spec(spec, candles)
                .map_err(|e| e.to_string())
                .and_then(|out| frame.insert_output(&spec.name, &out).map_err(|e| e.to_string()));
            if let Err(reason) = result {
                debug!(symbol = %candles.symbol, indicator = %spec.name, %reason, "indicator skipped");
                skipped.push((spec.name.clone(), reason));
            }
        }

        (frame, skipped)
    }

    /// Analyse candles already in hand.
    pub fn analyze(&self, candles: &CandleSeries) -> ResearchReport {
        let (frame, skipped) = self.build_frame(candles);

        let mut snapshot = IndicatorSnapshot::default();
        if let Some(last) = frame.len().checked_sub(1) {
            for name in frame.names() {
                if PRICE_COLUMNS.contains(&name) {
                    continue;
                }
                if let Ok(v) = frame.value(name, last) {
                    snapshot.values.insert(name.to_string(), v);
                }
            }
        }

        let conditions = self
            .conditions
            .iter()
            .map(|nc| {
                let (holds, error) = match nc.condition.evaluate_latest(&frame) {
                    Ok(b) => (Some(b), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                ConditionResult {
                    name: nc.name.clone(),
                    expression: nc.condition.to_string(),
                    holds,
                    error,
                }
            })
            .collect();

        let last = candles.last();
        ResearchReport {
            symbol: candles.symbol.clone(),
            generated_at: Utc::now(),
            candles: candles.len(),
            last_candle_start: last.as_ref().map(|c| c.start),
            last_close: last.map(|c| c.close),
            snapshot,
            conditions,
            skipped,
            assumptions: Vec::new(),
        }
    }

    /// Fetch the last `lookback` candles of `asset` ending at `now` and
    /// analyse them.  Returns the candles too so callers can feed live
    /// trackers without a second request.
    #[instrument(skip(self, source, asset), fields(symbol = %asset.symbol), name = "research::research")]
    pub async fn research<S: PriceSource>(
        &self,
        source: &S,
        asset: &AssetConfig,
        granularity: Granularity,
        lookback: usize,
        now: DateTime<Utc>,
    ) -> Result<(ResearchReport, CandleSeries), DataError> {
        let span = Duration::seconds(granularity.seconds() * lookback as i64);
        let candles = source
            .fetch_candles(&asset.symbol, now - span, now, granularity)
            .await?;
        let mut report = self.analyze(&candles);
        report.assumptions = asset.assumptions.clone();
        Ok((report, candles))
    }
}
