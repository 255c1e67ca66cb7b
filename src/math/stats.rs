//! Summary statistics for the cleaning stages.
//!
//! The imputation and outlier logic only needs a handful of estimators
//! (mode, median, percentiles, mean/std), but they have to behave
//! deterministically on ties and on small samples, so they live here with
//! explicit tie-breaking rules rather than being scattered across stages.

use std::collections::HashMap;
use std::hash::Hash;

/// Most frequent value; ties break toward the value seen first.
pub fn mode<T: Copy + Eq + Hash>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order: Vec<T> = Vec::new();

    for v in values {
        let count = counts.entry(v).or_insert(0);
        if *count == 0 {
            order.push(v);
        }
        *count += 1;
    }

    // Scan in first-seen order and replace only on a strictly higher count,
    // so ties resolve to the value seen first.
    let mut best: Option<(T, usize)> = None;
    for v in order {
        let count = counts.get(&v).copied().unwrap_or(0);
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((v, count));
        }
    }
    best.map(|(v, _)| v)
}

/// Median of a sample (mean of the middle pair for even sizes).
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Linear-interpolation percentile, `q` in `[0, 100]`.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }

    let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0, matching the scaler convention).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// IQR-style outlier fence with configurable quartile positions.
///
/// The anomaly stage uses an asymmetric fence (q25 / q85) inherited from the
/// data analysis that shaped this pipeline; keeping the positions as arguments
/// makes that choice visible at the call site.
pub fn outlier_bounds(values: &[f64], q_lo: f64, q_hi: f64) -> Option<(f64, f64)> {
    let lo = percentile(values, q_lo)?;
    let hi = percentile(values, q_hi)?;
    let iqr = hi - lo;
    Some((lo - 1.5 * iqr, hi + 1.5 * iqr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_breaks_ties_by_first_seen() {
        assert_eq!(mode([1, 2, 2, 3, 3]), Some(2));
        assert_eq!(mode([2, 3, 3, 2]), Some(2));
        assert_eq!(mode([5]), Some(5));
        assert_eq!(mode(Vec::<i32>::new()), None);
    }

    #[test]
    fn mode_prefers_strictly_higher_counts() {
        assert_eq!(mode([1, 3, 3, 2, 2, 2]), Some(2));
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn percentile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&xs, 0.0), Some(1.0));
        assert_eq!(percentile(&xs, 50.0), Some(3.0));
        assert_eq!(percentile(&xs, 100.0), Some(5.0));
        assert_eq!(percentile(&xs, 25.0), Some(2.0));
    }

    #[test]
    fn outlier_fence() {
        let xs: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let (lo, hi) = outlier_bounds(&xs, 25.0, 75.0).unwrap();
        assert!(lo < 1.0);
        assert!(hi > 100.0);

        let mut with_outlier = xs.clone();
        with_outlier.push(1e6);
        let (_, hi) = outlier_bounds(&with_outlier, 25.0, 85.0).unwrap();
        assert!(1e6 > hi);
    }

    #[test]
    fn std_dev_population() {
        let s = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s - 2.0).abs() < 1e-12);
    }
}
