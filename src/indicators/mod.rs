// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators used by the
// research pipeline.  Every series output is aligned index-for-index with its
// input (SMA excepted) and holds 0.0 before the indicator's warm-up threshold,
// which each function documents.  Indicators may run in parallel across
// assets; within one indicator the computation is sequential.

pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod facade;
pub mod macd;
pub mod primitives;
pub mod registry;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod supertrend;
pub mod williams_r;

pub use aroon::{aroon, AroonSeries};
pub use atr::{average_true_range, true_range};
pub use bollinger::{bollinger_bands, BollingerSeries};
pub use ema::{dema, ema, tema, trix};
pub use facade::{
    Indicators, Momentum, MomentumIndicators, TrendIndicators, Trends, Volatility,
    VolatilityIndicators,
};
pub use macd::{macd, MacdSeries};
pub use registry::{
    Capability, IndicatorOutput, IndicatorParams, IndicatorRegistry, IndicatorSpec,
};
pub use rolling::{variable_ewma, RollingEma, RollingSma, VariableEwma};
pub use rsi::{rsi, stoch_rsi, stoch_rsi_latest};
pub use sma::sma;
pub use supertrend::{supertrend, SuperTrendPoint, Trend};
pub use williams_r::williams_r;
