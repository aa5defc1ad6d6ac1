use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::candle::{CandleSeries, Ticker};

/// Candle width accepted by the exchange candles endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    OneMinute,
    FiveMinute,
    FifteenMinute,
    ThirtyMinute,
    #[default]
    OneHour,
    TwoHour,
    SixHour,
    OneDay,
}

impl Granularity {
    /// Value of the `granularity` query parameter.
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::OneMinute => "ONE_MINUTE",
            Self::FiveMinute => "FIVE_MINUTE",
            Self::FifteenMinute => "FIFTEEN_MINUTE",
            Self::ThirtyMinute => "THIRTY_MINUTE",
            Self::OneHour => "ONE_HOUR",
            Self::TwoHour => "TWO_HOUR",
            Self::SixHour => "SIX_HOUR",
            Self::OneDay => "ONE_DAY",
        }
    }

    /// Width of one candle in seconds.
    pub fn seconds(self) -> i64 {
        match self {
            Self::OneMinute => 60,
            Self::FiveMinute => 300,
            Self::FifteenMinute => 900,
            Self::ThirtyMinute => 1_800,
            Self::OneHour => 3_600,
            Self::TwoHour => 7_200,
            Self::SixHour => 21_600,
            Self::OneDay => 86_400,
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    /// Accepts the API names (`ONE_HOUR`) or a width in seconds (`3600`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Granularity; 8] = [
            Granularity::OneMinute,
            Granularity::FiveMinute,
            Granularity::FifteenMinute,
            Granularity::ThirtyMinute,
            Granularity::OneHour,
            Granularity::TwoHour,
            Granularity::SixHour,
            Granularity::OneDay,
        ];
        let s = s.trim();
        ALL.into_iter()
            .find(|g| g.as_api_str().eq_ignore_ascii_case(s) || g.seconds().to_string() == s)
            .ok_or_else(|| format!("unknown granularity '{s}'"))
    }
}

/// Failure to obtain price data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{symbol}: price data unavailable: {reason}")]
    Unavailable { symbol: String, reason: String },
    #[error("{symbol}: malformed price data: {reason}")]
    Malformed { symbol: String, reason: String },
}

impl DataError {
    pub fn unavailable(symbol: &str, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(symbol: &str, reason: impl std::fmt::Display) -> Self {
        Self::Malformed {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Anything that can supply historical candles and a current ticker.
pub trait PriceSource: Send + Sync {
    /// Candles for `symbol` in `[start, end]`, oldest first.
    fn fetch_candles(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> impl Future<Output = Result<CandleSeries, DataError>> + Send;

    fn fetch_ticker(&self, symbol: &str) -> impl Future<Output = Result<Ticker, DataError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_parses_names_and_seconds() {
        assert_eq!("ONE_HOUR".parse::<Granularity>(), Ok(Granularity::OneHour));
        assert_eq!("six_hour".parse::<Granularity>(), Ok(Granularity::SixHour));
        assert_eq!("900".parse::<Granularity>(), Ok(Granularity::FifteenMinute));
        assert!("TEN_MINUTE".parse::<Granularity>().is_err());
    }

    #[test]
    fn granularity_serde_uses_api_names() {
        let json = serde_json::to_string(&Granularity::FiveMinute).unwrap();
        assert_eq!(json, "\"FIVE_MINUTE\"");
        let back: Granularity = serde_json::from_str("\"ONE_DAY\"").unwrap();
        assert_eq!(back, Granularity::OneDay);
        assert_eq!(back.seconds(), 86_400);
    }

    #[test]
    fn granularity_defaults_to_one_hour() {
        assert_eq!(Granularity::default(), Granularity::OneHour);
    }

    #[test]
    fn data_error_messages() {
        let e = DataError::unavailable("BTC-USD", "HTTP 503");
        assert_eq!(e.to_string(), "BTC-USD: price data unavailable: HTTP 503");
        let e = DataError::malformed("BTC-USD", "missing close");
        assert!(e.to_string().contains("malformed"));
    }
}
