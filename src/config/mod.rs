// =============================================================================
// Research Configuration: watched assets, indicator settings, conditions
// =============================================================================
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.  A handful of settings can be overridden from the environment
// (see `with_env_overrides`).  Overrides apply to a copy so the file on
// disk never picks them up.
// =============================================================================

pub mod env;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::{IndicatorParams, IndicatorSpec};
use crate::market_data::Granularity;
use crate::strategy::NamedCondition;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "recon_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_assets() -> Vec<AssetConfig> {
    ["BTC-USD", "ETH-USD", "SOL-USD"]
        .into_iter()
        .map(AssetConfig::new)
        .collect()
}

fn default_market() -> String {
    "crypto".to_string()
}

fn default_research_interval_secs() -> u64 {
    300
}

fn default_lookback_candles() -> usize {
    300
}

fn default_rsi_period() -> usize {
    14
}

fn default_stoch_period() -> usize {
    14
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_multiplier() -> f64 {
    2.0
}

fn default_ema_period() -> usize {
    21
}

fn default_sma_period() -> usize {
    20
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_supertrend_period() -> usize {
    10
}

fn default_supertrend_multiplier() -> f64 {
    3.0
}

fn default_aroon_period() -> usize {
    25
}

fn default_trix_period() -> usize {
    15
}

fn default_williams_period() -> usize {
    14
}

fn default_atr_period() -> usize {
    14
}

fn default_ewma_alpha() -> f64 {
    0.1
}

// =============================================================================
// Assets
// =============================================================================

/// A thesis the operator holds about an asset.  `sentiment` is `true` for a
/// bullish assumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub text: String,
    #[serde(default)]
    pub sentiment: bool,
}

/// One watched asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Exchange product id, e.g. "BTC-USD".
    pub symbol: String,
    #[serde(default = "default_market")]
    pub market: String,
    #[serde(default)]
    pub assumptions: Vec<Assumption>,
}

impl AssetConfig {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            market: default_market(),
            assumptions: Vec::new(),
        }
    }
}

// =============================================================================
// IndicatorSettings
// =============================================================================

/// Periods and multipliers for every indicator the research loop computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,
    #[serde(default = "default_trix_period")]
    pub trix_period: usize,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    #[serde(default = "default_supertrend_period")]
    pub supertrend_period: usize,
    #[serde(default = "default_supertrend_multiplier")]
    pub supertrend_multiplier: f64,
    #[serde(default = "default_aroon_period")]
    pub aroon_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_stoch_period")]
    pub stoch_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_multiplier")]
    pub bollinger_multiplier: f64,
    #[serde(default = "default_williams_period")]
    pub williams_period: usize,

    /// Smoothing for the live variable EWMA tracker.
    #[serde(default = "default_ewma_alpha")]
    pub ewma_alpha: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            sma_period: default_sma_period(),
            ema_period: default_ema_period(),
            trix_period: default_trix_period(),
            atr_period: default_atr_period(),
            supertrend_period: default_supertrend_period(),
            supertrend_multiplier: default_supertrend_multiplier(),
            aroon_period: default_aroon_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            rsi_period: default_rsi_period(),
            stoch_period: default_stoch_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_multiplier: default_bollinger_multiplier(),
            williams_period: default_williams_period(),
            ewma_alpha: default_ewma_alpha(),
        }
    }
}

impl IndicatorSettings {
    /// Registry requests for every built-in indicator.
    pub fn specs(&self) -> Vec<IndicatorSpec> {
        let period = |name: &str, period: usize| IndicatorSpec {
            name: name.to_string(),
            params: IndicatorParams::Period { period },
        };
        vec![
            period("SMA", self.sma_period),
            period("EMA", self.ema_period),
            period("DEMA", self.ema_period),
            period("TEMA", self.ema_period),
            period("TRIX", self.trix_period),
            IndicatorSpec {
                name: "TrueRange".to_string(),
                params: IndicatorParams::None,
            },
            period("ATR", self.atr_period),
            IndicatorSpec {
                name: "SuperTrend".to_string(),
                params: IndicatorParams::Bands {
                    period: self.supertrend_period,
                    multiplier: self.supertrend_multiplier,
                },
            },
            period("Aroon", self.aroon_period),
            IndicatorSpec {
                name: "MACD".to_string(),
                params: IndicatorParams::Macd {
                    fast: self.macd_fast,
                    slow: self.macd_slow,
                    signal: self.macd_signal,
                },
            },
            period("RSI", self.rsi_period),
            IndicatorSpec {
                name: "StochRSI".to_string(),
                params: IndicatorParams::StochRsi {
                    rsi_period: self.rsi_period,
                    stoch_period: self.stoch_period,
                },
            },
            IndicatorSpec {
                name: "BollingerBands".to_string(),
                params: IndicatorParams::Bands {
                    period: self.bollinger_period,
                    multiplier: self.bollinger_multiplier,
                },
            },
            period("WilliamsR", self.williams_period),
        ]
    }
}

// =============================================================================
// ResearchConfig
// =============================================================================

/// Top-level configuration for the research service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Assets the research loop watches.
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetConfig>,

    /// Candle width requested from the exchange.
    #[serde(default)]
    pub granularity: Granularity,

    /// Seconds between research passes.
    #[serde(default = "default_research_interval_secs")]
    pub research_interval_secs: u64,

    /// Candles requested per pass (ending now).
    #[serde(default = "default_lookback_candles")]
    pub lookback_candles: usize,

    #[serde(default)]
    pub indicators: IndicatorSettings,

    /// Conditions evaluated at the latest candle on every pass.
    #[serde(default)]
    pub conditions: Vec<NamedCondition>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            granularity: Granularity::default(),
            research_interval_secs: default_research_interval_secs(),
            lookback_candles: default_lookback_candles(),
            indicators: IndicatorSettings::default(),
            conditions: Vec::new(),
        }
    }
}

impl ResearchConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read research config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse research config from {}", path.display()))?;

        info!(
            path = %path.display(),
            assets = config.assets.len(),
            granularity = %config.granularity,
            conditions = config.conditions.len(),
            "research config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise research config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "research config saved (atomic)");
        Ok(())
    }

    /// Copy of this config with `RECON_SYMBOLS`, `RECON_GRANULARITY` and
    /// `RECON_RESEARCH_INTERVAL` applied from the environment.  `self` stays
    /// as loaded and is what gets saved.
    pub fn with_env_overrides(&self) -> Self {
        let mut cfg = self.clone();

        if let Some(raw) = env::get_optional("RECON_SYMBOLS") {
            cfg.set_symbols(&raw);
            info!(symbols = %raw, "asset list overridden from environment");
        }

        if let Some(raw) = env::get_optional("RECON_GRANULARITY") {
            match raw.parse::<Granularity>() {
                Ok(g) => {
                    cfg.granularity = g;
                    info!(granularity = %g, "granularity overridden from environment");
                }
                Err(e) => warn!(error = %e, "ignoring RECON_GRANULARITY"),
            }
        }

        let interval = env::get_int("RECON_RESEARCH_INTERVAL", cfg.research_interval_secs as i64);
        if interval > 0 {
            cfg.research_interval_secs = interval as u64;
        } else {
            warn!(interval, "ignoring non-positive RECON_RESEARCH_INTERVAL");
        }

        cfg
    }

    /// Replace the watched assets with a comma-separated symbol list,
    /// keeping the settings of symbols that were already configured.
    pub fn set_symbols(&mut self, list: &str) {
        let previous = std::mem::take(&mut self.assets);
        self.assets = list
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .map(|symbol| {
                previous
                    .iter()
                    .find(|a| a.symbol == symbol)
                    .cloned()
                    .unwrap_or_else(|| AssetConfig::new(&symbol))
            })
            .collect();
    }

    /// Reject settings the research loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            anyhow::bail!("no assets configured");
        }
        if self.research_interval_secs == 0 {
            anyhow::bail!("research_interval_secs must be positive");
        }
        if self.lookback_candles == 0 {
            anyhow::bail!("lookback_candles must be positive");
        }
        let alpha = self.indicators.ewma_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            anyhow::bail!("ewma_alpha must be in (0, 1], got {alpha}");
        }
        Ok(())
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.symbol.as_str()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ResearchConfig::default();
        assert_eq!(cfg.symbols(), vec!["BTC-USD", "ETH-USD", "SOL-USD"]);
        assert_eq!(cfg.granularity, Granularity::OneHour);
        assert_eq!(cfg.research_interval_secs, 300);
        assert_eq!(cfg.indicators.rsi_period, 14);
        assert_eq!(cfg.indicators.macd_slow, 26);
        assert!((cfg.indicators.bollinger_multiplier - 2.0).abs() < f64::EPSILON);
        assert!(cfg.conditions.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ResearchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, ResearchConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "assets": [{ "symbol": "DOGE-USD",
                         "assumptions": [{ "text": "meme season", "sentiment": true }] }],
            "granularity": "FIFTEEN_MINUTE",
            "indicators": { "rsi_period": 7 },
            "conditions": [{
                "name": "oversold",
                "condition": { "type": "compare", "operator": "<",
                               "left": { "class": "indicator", "value": "RSI" },
                               "right": { "class": "constant", "value": 30 } }
            }]
        }"#;
        let cfg: ResearchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.assets[0].market, "crypto");
        assert!(cfg.assets[0].assumptions[0].sentiment);
        assert_eq!(cfg.granularity, Granularity::FifteenMinute);
        assert_eq!(cfg.indicators.rsi_period, 7);
        assert_eq!(cfg.indicators.stoch_period, 14);
        assert_eq!(cfg.conditions[0].name, "oversold");
    }

    #[test]
    fn specs_cover_every_registered_indicator() {
        let registry = crate::indicators::IndicatorRegistry::with_defaults();
        let specs = IndicatorSettings::default().specs();
        let mut names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, registry.names());
    }

    #[test]
    fn set_symbols_keeps_existing_assumptions() {
        let mut cfg = ResearchConfig::default();
        cfg.assets[1].assumptions.push(Assumption {
            text: "ETF flows".into(),
            sentiment: true,
        });
        cfg.set_symbols("eth-usd, ADA-USD,,");
        assert_eq!(cfg.symbols(), vec!["ETH-USD", "ADA-USD"]);
        assert_eq!(cfg.assets[0].assumptions.len(), 1);
        assert!(cfg.assets[1].assumptions.is_empty());
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut cfg = ResearchConfig::default();
        cfg.indicators.ewma_alpha = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ResearchConfig::default();
        cfg.assets.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("recon_config_{}.json", std::process::id()));
        let mut cfg = ResearchConfig::default();
        cfg.lookback_candles = 120;
        cfg.save(&path).unwrap();
        let loaded = ResearchConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert!(!path.with_extension("json.tmp").exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn env_overrides_stay_out_of_saved_file() {
        std::env::set_var("RECON_SYMBOLS", "ada-usd");
        std::env::set_var("RECON_RESEARCH_INTERVAL", "60");
        let loaded = ResearchConfig::default();
        let effective = loaded.with_env_overrides();
        std::env::remove_var("RECON_SYMBOLS");
        std::env::remove_var("RECON_RESEARCH_INTERVAL");

        assert_eq!(effective.symbols(), vec!["ADA-USD"]);
        assert_eq!(effective.research_interval_secs, 60);
        assert_eq!(loaded, ResearchConfig::default());

        let path = std::env::temp_dir().join(format!("recon_config_env_{}.json", std::process::id()));
        loaded.save(&path).unwrap();
        let reloaded = ResearchConfig::load(&path).unwrap();
        assert_eq!(reloaded.symbols(), vec!["BTC-USD", "ETH-USD", "SOL-USD"]);
        assert_eq!(reloaded.research_interval_secs, 300);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(ResearchConfig::load("/nonexistent/recon_config.json").is_err());
    }
}
