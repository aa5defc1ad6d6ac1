// =============================================================================
// recon-ta: technical-analysis research toolkit
// =============================================================================
//
// Indicator library (trend, volatility, momentum, incremental accumulators),
// a name-based indicator registry, strategy conditions over indicator values,
// and a research service that pulls candles from Coinbase and reports on them.
// =============================================================================

pub mod app_state;
pub mod coinbase;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod research;
pub mod strategy;

pub use error::IndicatorError;
