// =============================================================================
// Exponential Moving Averages: EMA, DEMA, TEMA, TRIX
// =============================================================================
//
// EMA gives more weight to recent prices than the SMA.
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = (close_t - EMA_{t-1}) * multiplier + EMA_{t-1}
//
// The first EMA value is seeded with the SMA of the first `period` closes and
// sits at index `period - 1`; everything before it is zero.
//
// Derived averages chain EMAs:
//   DEMA = 2*EMA1 - EMA2                  (zero before 2*period - 2)
//   TEMA = 3*E1 - 3*E2 + E3               (zero before period - 1)
//   TRIX = % change of EMA(EMA(EMA))      (zero before 3*period - 2)
// =============================================================================

/// Smoothing factor for a `period`-bar EMA.
#[inline]
pub fn smoothing(period: usize) -> f64 {
    2.0 / (period + 1) as f64
}

/// SMA-seeded EMA over `values[start..]`, written back at full length.
///
/// Indices before `start + period - 1` are zero.  When fewer than `period`
/// values remain after `start` the whole output is zero.
fn seeded_ema_from(values: &[f64], start: usize, period: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || start + period > values.len() {
        return out;
    }

    let seed_idx = start + period - 1;
    out[seed_idx] = values[start..=seed_idx].iter().sum::<f64>() / period as f64;

    let k = smoothing(period);
    for i in seed_idx + 1..values.len() {
        out[i] = (values[i] - out[i - 1]) * k + out[i - 1];
    }
    out
}

/// EMA seeded with the first input value (no SMA warm-up).
fn recursive_ema(values: &[f64], k: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev = match values.first() {
        Some(&v) => v,
        None => return out,
    };
    out.push(prev);
    for &v in &values[1..] {
        prev = v * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

/// Compute the EMA series for `prices` and look-back `period`.
///
/// The output is aligned with the input.  A `period` longer than the series is
/// clamped to the series length.
///
/// # Edge cases
/// - empty input or `period == 0` => empty vec ("nothing computable")
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.is_empty() || period == 0 {
        return Vec::new();
    }
    seeded_ema_from(prices, 0, period.min(prices.len()))
}

/// Double EMA: `2*EMA1 - EMA2`, where EMA2 smooths the defined part of EMA1.
///
/// Values before index `2*period - 2` are zero.
pub fn dema(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.is_empty() || period == 0 {
        return Vec::new();
    }
    let period = period.min(prices.len());
    let ema1 = seeded_ema_from(prices, 0, period);
    let ema2 = seeded_ema_from(&ema1, period - 1, period);

    let warm_up = 2 * period - 2;
    let mut out = vec![0.0; prices.len()];
    for i in warm_up..prices.len() {
        out[i] = 2.0 * ema1[i] - ema2[i];
    }
    out
}

/// Triple EMA: `3*E1 - 3*E2 + E3`.
///
/// Each stage is a recursive EMA with `2/(period+1)` smoothing seeded with the
/// first value of its input, so the result is defined from `period - 1`.
pub fn tema(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.is_empty() || period == 0 {
        return Vec::new();
    }
    let k = smoothing(period);
    let e1 = recursive_ema(prices, k);
    let e2 = recursive_ema(&e1, k);
    let e3 = recursive_ema(&e2, k);

    let mut out = vec![0.0; prices.len()];
    for i in (period - 1)..prices.len() {
        out[i] = 3.0 * e1[i] - 3.0 * e2[i] + e3[i];
    }
    out
}

/// TRIX: percent rate-of-change of a triple-smoothed EMA.
///
/// # Edge cases
/// - `period == 0` or `prices.len() < period` => empty vec
/// - index 0 is always zero (no prior value)
/// - zero wherever the previous triple EMA is undefined or zero
pub fn trix(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    let ema1 = seeded_ema_from(prices, 0, period);
    let ema2 = seeded_ema_from(&ema1, period - 1, period);
    let ema3 = seeded_ema_from(&ema2, 2 * period - 2, period);

    // ema3 is defined from 3*period - 3; the first change needs one more bar.
    let first = (3 * period - 2).max(1);
    let mut out = vec![0.0; prices.len()];
    for i in first..prices.len() {
        let prev = ema3[i - 1];
        if prev != 0.0 {
            out[i] = (ema3[i] - prev) / prev * 100.0;
        }
    }
    out
}
