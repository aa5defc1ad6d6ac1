// =============================================================================
// Williams %R: Momentum Indicator
// =============================================================================
//
// Position of the close inside the trailing high/low range:
//   %R = (highest_high - close) / (highest_high - lowest_low) * -100
//
// Ranges from -100 (close at the low) to 0 (close at the high).  A flat window
// has no range and reports 0.

/// Calculate Williams %R over `prices`.
///
/// Returns an all-zero series when `period == 0` or `prices.len() < period`.
pub fn williams_r(prices: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; prices.len()];
    if period == 0 || prices.len() < period {
        return out;
    }

    for (offset, window) in prices.windows(period).enumerate() {
        let i = offset + period - 1;
        let (hh, ll) = window
            .iter()
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(hh, ll), &p| (hh.max(p), ll.min(p)));
        if hh != ll {
            out[i] = (hh - prices[i]) / (hh - ll) * -100.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn williams_r_insufficient_data() {
        assert_eq!(williams_r(&[1.0, 2.0], 5), vec![0.0, 0.0]);
        assert_eq!(williams_r(&[1.0, 2.0], 0), vec![0.0, 0.0]);
    }

    #[test]
    fn williams_r_known_values() {
        let out = williams_r(&[10.0, 20.0, 15.0, 5.0], 3);
        assert_eq!(&out[..2], &[0.0, 0.0]);
        // window [10, 20, 15]: (20 - 15) / 10 * -100
        assert!((out[2] + 50.0).abs() < 1e-12);
        // window [20, 15, 5]: close at the low
        assert!((out[3] + 100.0).abs() < 1e-12);
    }

    #[test]
    fn williams_r_flat_window_at_top() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0, 5.0, 5.0];
        let out = williams_r(&prices, 3);
        assert_eq!(out[6], 0.0);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn williams_r_single_bar_window_is_flat() {
        assert_eq!(williams_r(&[3.0, 7.0, 5.0], 1), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn williams_r_stays_in_range() {
        let prices: Vec<f64> = (0..100).map(|i| (i as f64 * 0.21).sin() * 3.0 + 10.0).collect();
        for v in williams_r(&prices, 14) {
            assert!((-100.0..=0.0).contains(&v));
        }
    }
}
