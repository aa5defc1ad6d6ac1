// =============================================================================
// SuperTrend
// =============================================================================
//
// Trend-following overlay built from ATR bands around the bar midpoint:
//
//   basic_upper = (H + L) / 2 + multiplier * ATR
//   basic_lower = (H + L) / 2 - multiplier * ATR
//
// The active bands ratchet: the upper band only moves down unless the previous
// close broke above it, the lower band only moves up unless the previous close
// broke below it.  The published level and trend form a two-state machine:
//
//   close <= upper  and published != upper  => publish upper, trend = Up
//   close >  upper  and published != lower  => publish lower, trend = Down
//
// Otherwise the previous level and trend carry over.  Each bar depends on the
// state left by the previous one, so this is strictly sequential.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::atr::{average_true_range, true_range};
use crate::error::IndicatorError;

/// Discrete trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// One SuperTrend output bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SuperTrendPoint {
    /// Published band level (zero during warm-up).
    pub value: f64,
    /// `None` during warm-up.
    pub trend: Option<Trend>,
}

/// Compute SuperTrend from aligned high/low/close series.
///
/// Bars before index `period` are warm-up points (`value == 0`, no trend).
///
/// # Errors
/// - `MisalignedSeries` on length mismatch
/// - `InvalidPeriod` when `period == 0`
/// - `InsufficientData` when fewer than `period + 1` bars are supplied
pub fn supertrend(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<Vec<SuperTrendPoint>, IndicatorError> {
    let tr = true_range(high, low, close)?;
    let atr = average_true_range(&tr, period)?;

    let mut points = vec![SuperTrendPoint::default(); close.len()];

    let mut upper = 0.0_f64;
    let mut lower = 0.0_f64;
    let mut published = 0.0_f64;
    let mut trend: Option<Trend> = None;

    for i in period..close.len() {
        let mid = (high[i] + low[i]) / 2.0;
        let basic_upper = mid + multiplier * atr[i];
        let basic_lower = mid - multiplier * atr[i];

        if basic_upper < upper || close[i - 1] > upper {
            upper = basic_upper;
        }
        if basic_lower > lower || close[i - 1] < lower {
            lower = basic_lower;
        }

        if close[i] <= upper {
            if published != upper {
                published = upper;
                trend = Some(Trend::Up);
            }
        } else if published != lower {
            published = lower;
            trend = Some(Trend::Down);
        }

        points[i] = SuperTrendPoint {
            value: published,
            trend,
        };
    }

    Ok(points)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Oscillating bars with a slow drift: enough structure for flips.
    fn bars(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let close: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.25).sin() * 12.0 + i as f64 * 0.05)
            .collect();
        let high = close.iter().map(|c| c + 1.5).collect();
        let low = close.iter().map(|c| c - 1.5).collect();
        (high, low, close)
    }

    #[test]
    fn supertrend_warm_up_points_are_empty() {
        let (h, l, c) = bars(60);
        let st = supertrend(&h, &l, &c, 10, 3.0).unwrap();
        assert_eq!(st.len(), 60);
        assert!(st[..10].iter().all(|p| p.value == 0.0 && p.trend.is_none()));
        assert!(st[10..].iter().all(|p| p.trend.is_some()));
    }

    #[test]
    fn supertrend_flips_only_when_band_changes() {
        let (h, l, c) = bars(200);
        let st = supertrend(&h, &l, &c, 7, 1.0).unwrap();
        for i in 11..st.len() {
            if st[i].trend != st[i - 1].trend {
                assert_ne!(st[i].value, st[i - 1].value, "flip at {i} without band change");
            }
            if st[i].value == st[i - 1].value {
                assert_eq!(st[i].trend, st[i - 1].trend);
            }
        }
    }

    #[test]
    fn supertrend_detects_both_directions() {
        let (h, l, c) = bars(200);
        let st = supertrend(&h, &l, &c, 7, 1.0).unwrap();
        assert!(st.iter().any(|p| p.trend == Some(Trend::Up)));
        assert!(st.iter().any(|p| p.trend == Some(Trend::Down)));
    }

    #[test]
    fn supertrend_misaligned_inputs() {
        let err = supertrend(&[1.0, 2.0, 3.0], &[1.0, 2.0], &[1.0, 2.0, 3.0], 1, 3.0);
        assert!(matches!(err, Err(IndicatorError::MisalignedSeries { .. })));
    }

    #[test]
    fn supertrend_insufficient_data() {
        let (h, l, c) = bars(5);
        assert!(matches!(
            supertrend(&h, &l, &c, 10, 3.0),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn supertrend_is_deterministic() {
        let (h, l, c) = bars(120);
        let a = supertrend(&h, &l, &c, 10, 2.0).unwrap();
        let b = supertrend(&h, &l, &c, 10, 2.0).unwrap();
        assert_eq!(a, b);
    }
}
