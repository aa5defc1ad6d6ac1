// =============================================================================
// Error Types
// =============================================================================
//
// Indicator functions report *why* nothing could be computed so the caller can
// decide whether to accumulate more data and retry.  Degenerate windows (flat
// ranges, zero divisors) never surface here: each indicator resolves them to a
// documented sentinel value.

use thiserror::Error;

/// Errors raised by indicator computation, the registry and the accumulators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// Non-positive or otherwise meaningless lookback window.
    #[error("invalid period {period} for {indicator}")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },

    /// Series shorter than the minimum the formula requires.
    #[error("insufficient data: need {required} values, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Parallel series (high/low/close) of different lengths.
    #[error("misaligned series: expected length {expected}, got {actual}")]
    MisalignedSeries { expected: usize, actual: usize },

    /// Smoothing factor outside `(0, 1]`.
    #[error("invalid smoothing factor {0} (must be in (0, 1])")]
    InvalidSmoothing(f64),

    /// Name not present in the indicator registry.
    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),

    /// Parameter shape does not match what the indicator expects.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl IndicatorError {
    pub(crate) fn invalid_period(indicator: &'static str, period: usize) -> Self {
        Self::InvalidPeriod { indicator, period }
    }

    pub(crate) fn insufficient(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Creates an `InvalidParams` error with a message.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// `true` when retrying with a longer series could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Ensure every series in `others` has the same length as `expected`.
pub(crate) fn check_aligned(expected: usize, others: &[usize]) -> Result<(), IndicatorError> {
    match others.iter().find(|&&len| len != expected) {
        Some(&actual) => Err(IndicatorError::MisalignedSeries { expected, actual }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_is_retryable() {
        assert!(IndicatorError::insufficient(10, 3).is_retryable());
        assert!(!IndicatorError::invalid_period("SMA", 0).is_retryable());
    }

    #[test]
    fn check_aligned_reports_first_mismatch() {
        assert!(check_aligned(5, &[5, 5]).is_ok());
        assert_eq!(
            check_aligned(5, &[5, 4, 3]),
            Err(IndicatorError::MisalignedSeries {
                expected: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn messages_name_the_problem() {
        let err = IndicatorError::invalid_period("EMA", 0);
        assert_eq!(err.to_string(), "invalid period 0 for EMA");
        let err = IndicatorError::insufficient(28, 12);
        assert_eq!(err.to_string(), "insufficient data: need 28 values, got 12");
    }
}
