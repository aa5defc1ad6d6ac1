pub mod candle;
pub mod source;

// Re-export for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, CandleSeries, Ticker};
pub use source::{DataError, Granularity, PriceSource};
