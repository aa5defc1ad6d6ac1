// =============================================================================
// Windowed Primitives
// =============================================================================
//
// Reductions over a fixed-length slice of a price series.  They carry no
// warm-up concept: callers slice the window they need.  An empty window has
// no defined value and is reported as insufficient data.
//
// Index helpers return the first (oldest) position on ties.
// =============================================================================

use crate::error::IndicatorError;

fn non_empty(window: &[f64]) -> Result<(), IndicatorError> {
    if window.is_empty() {
        Err(IndicatorError::insufficient(1, 0))
    } else {
        Ok(())
    }
}

/// Sum of every value in `window` (zero for an empty window).
pub fn sum(window: &[f64]) -> f64 {
    window.iter().sum()
}

/// Arithmetic mean of `window`.
pub fn mean(window: &[f64]) -> Result<f64, IndicatorError> {
    non_empty(window)?;
    Ok(sum(window) / window.len() as f64)
}

/// Population standard deviation of `window` around a precomputed `mean`.
pub fn std_dev(window: &[f64], mean: f64) -> Result<f64, IndicatorError> {
    non_empty(window)?;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / window.len() as f64;
    Ok(variance.sqrt())
}

/// Largest value in `window`.
pub fn highest(window: &[f64]) -> Result<f64, IndicatorError> {
    non_empty(window)?;
    Ok(window.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Smallest value in `window`.
pub fn lowest(window: &[f64]) -> Result<f64, IndicatorError> {
    non_empty(window)?;
    Ok(window.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Position of the largest value in `window`.
pub fn highest_index(window: &[f64]) -> Result<usize, IndicatorError> {
    non_empty(window)?;
    let mut best = 0;
    for (i, &v) in window.iter().enumerate().skip(1) {
        if v > window[best] {
            best = i;
        }
    }
    Ok(best)
}

/// Position of the smallest value in `window`.
pub fn lowest_index(window: &[f64]) -> Result<usize, IndicatorError> {
    non_empty(window)?;
    let mut best = 0;
    for (i, &v) in window.iter().enumerate().skip(1) {
        if v < window[best] {
            best = i;
        }
    }
    Ok(best)
}
