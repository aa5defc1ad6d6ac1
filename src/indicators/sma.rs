// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = (close_{t-period+1} + ... + close_t) / period
//
// Unlike the other indicators the output is *shorter* than the input: one
// value per complete window, so there is no zero-filled warm-up prefix.
// Output index `j` corresponds to input index `j + period - 1`.
// =============================================================================

use crate::error::IndicatorError;

/// Compute the SMA of `prices` over `period`.
///
/// # Errors
/// - `InvalidPeriod` when `period == 0`
/// - `InsufficientData` when `prices.len() < period`
pub fn sma(prices: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::invalid_period("SMA", period));
    }
    if prices.len() < period {
        return Err(IndicatorError::insufficient(period, prices.len()));
    }

    // Summed per window (no running sum) so each value is the exact mean.
    Ok(prices
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_known_values() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sma_length_matches_window_count() {
        let prices: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin() * 10.0 + 50.0).collect();
        for period in 1..=40 {
            let out = sma(&prices, period).unwrap();
            assert_eq!(out.len(), prices.len() - period + 1);
            for (j, v) in out.iter().enumerate() {
                let expected = prices[j..j + period].iter().sum::<f64>() / period as f64;
                assert!((v - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn sma_period_zero() {
        assert_eq!(
            sma(&[1.0, 2.0], 0),
            Err(IndicatorError::InvalidPeriod {
                indicator: "SMA",
                period: 0
            })
        );
    }

    #[test]
    fn sma_insufficient_data() {
        assert_eq!(
            sma(&[1.0, 2.0], 3),
            Err(IndicatorError::InsufficientData {
                required: 3,
                available: 2
            })
        );
    }

    #[test]
    fn sma_period_equals_length() {
        assert_eq!(sma(&[2.0, 4.0, 6.0], 3).unwrap(), vec![4.0]);
    }
}
