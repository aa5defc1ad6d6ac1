// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same window.  The Band Width is the normalised distance:
// BBW = (upper - lower) / middle * 100.
//
// Every band is aligned with the input; indices before `period - 1` are zero
// placeholders the caller must trim.
// =============================================================================

use serde::Serialize;

use super::primitives::{mean, std_dev};
use crate::error::IndicatorError;

/// Middle / upper / lower bands, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BollingerSeries {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerSeries {
    /// Band Width at index `i`, or `None` when the middle band is zero.
    pub fn width(&self, i: usize) -> Option<f64> {
        let middle = *self.middle.get(i)?;
        if middle == 0.0 {
            return None;
        }
        let width = (self.upper[i] - self.lower[i]) / middle * 100.0;
        width.is_finite().then_some(width)
    }
}

/// Calculate Bollinger Bands over `prices`.
///
/// A series shorter than `period` yields placeholders only.
///
/// # Errors
/// `InvalidPeriod` when `period == 0`.
pub fn bollinger_bands(
    prices: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<BollingerSeries, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::invalid_period("BollingerBands", period));
    }

    let n = prices.len();
    let mut out = BollingerSeries {
        middle: vec![0.0; n],
        upper: vec![0.0; n],
        lower: vec![0.0; n],
    };

    for (offset, window) in prices.windows(period).enumerate() {
        let i = offset + period - 1;
        let mid = mean(window)?;
        let band = std_dev(window, mid)? * multiplier;
        out.middle[i] = mid;
        out.upper[i] = mid + band;
        out.lower[i] = mid - band;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = bollinger_bands(&closes, 20, 2.0).unwrap();
        assert!(bb.upper[19] > bb.middle[19]);
        assert!(bb.lower[19] < bb.middle[19]);
        assert!((bb.middle[19] - 10.5).abs() < 1e-12);
        assert!(bb.width(19).unwrap() > 0.0);
    }

    #[test]
    fn bollinger_width_is_twice_k_sigma() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.3).sin() * 4.0).collect();
        let (period, k) = (10, 2.5);
        let bb = bollinger_bands(&closes, period, k).unwrap();
        for i in period - 1..closes.len() {
            let window = &closes[i + 1 - period..=i];
            let sigma = std_dev(window, mean(window).unwrap()).unwrap();
            assert!((bb.upper[i] - bb.lower[i] - 2.0 * k * sigma).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_placeholders_before_warm_up() {
        let bb = bollinger_bands(&[1.0, 2.0, 3.0, 4.0, 5.0], 3, 2.0).unwrap();
        assert_eq!(&bb.middle[..2], &[0.0, 0.0]);
        assert_eq!(&bb.upper[..2], &[0.0, 0.0]);
        assert!((bb.middle[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bollinger_insufficient_data_is_all_placeholder() {
        let bb = bollinger_bands(&[1.0, 2.0, 3.0], 20, 2.0).unwrap();
        assert_eq!(bb.middle, vec![0.0; 3]);
        assert!(bb.width(0).is_none());
    }

    #[test]
    fn bollinger_flat() {
        let bb = bollinger_bands(&[100.0; 20], 20, 2.0).unwrap();
        assert!((bb.width(19).unwrap() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_period_zero() {
        assert!(bollinger_bands(&[1.0], 0, 2.0).is_err());
    }
}
