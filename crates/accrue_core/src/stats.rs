//! Order statistics shared by the engine and the scenario locator.
//!
//! All percentiles in the crate go through [`percentile_sorted`] so the yearly
//! table and the scenario targets agree exactly.

/// Sort a sample ascending. NaN never reaches here: balances are checked for
/// finiteness as they are produced.
pub fn sort_values(values: &mut [f64]) {
    values.sort_unstable_by(f64::total_cmp);
}

/// Percentile `p` (a fraction in `[0, 1]`) of an ascending sample, linearly
/// interpolated between the order statistics around `h = (n - 1) p`.
///
/// # Panics
/// Panics if `sorted` is empty.
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let h = last as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let (a, b) = (sorted[lo], sorted[hi]);
    a + (h - lo as f64) * (b - a)
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Number of histogram bins for a sample of `n`: `ceil(sqrt(n))`, at least one.
#[must_use]
pub fn histogram_bins(n: usize) -> usize {
    ((n as f64).sqrt().ceil() as usize).max(1)
}

/// Mode estimate: center of the fullest of [`histogram_bins`] equal-width bins
/// spanning the sample; the lowest such bin wins ties.
///
/// # Panics
/// Panics if `sorted` is empty.
#[must_use]
pub fn histogram_mode(sorted: &[f64]) -> f64 {
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    if max <= min {
        return min;
    }
    let bins = histogram_bins(sorted.len());
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in sorted {
        let k = (((v - min) / width) as usize).min(bins - 1);
        counts[k] += 1;
    }
    let mut best = 0;
    for (k, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = k;
        }
    }
    min + (best as f64 + 0.5) * width
}

/// Summary statistics of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub min: f64,
    pub max: f64,
    pub lower: f64,
    pub upper: f64,
    pub std_dev: f64,
}

impl SampleStats {
    /// Compute statistics of an ascending, non-empty sample.
    ///
    /// # Panics
    /// Panics if `sorted` is empty.
    #[must_use]
    pub fn from_sorted(sorted: &[f64], lower: f64, upper: f64) -> Self {
        let mean = mean(sorted);
        Self {
            mean,
            median: percentile_sorted(sorted, 0.5),
            mode: histogram_mode(sorted),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            lower: percentile_sorted(sorted, lower),
            upper: percentile_sorted(sorted, upper),
            std_dev: std_dev(sorted, mean),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&v, 0.0), 1.0);
        assert_eq!(percentile_sorted(&v, 0.5), 3.0);
        assert_eq!(percentile_sorted(&v, 1.0), 5.0);
        // h = 4 * 0.1 = 0.4
        assert!((percentile_sorted(&v, 0.1) - 1.4).abs() < 1e-12);
        // h = 4 * 0.9 = 3.6
        assert!((percentile_sorted(&v, 0.9) - 4.6).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile_sorted(&[7.0], 0.37), 7.0);
    }

    #[test]
    fn test_percentile_even_median() {
        let v = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile_sorted(&v, 0.5), 25.0);
    }

    #[test]
    fn test_mean_and_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&v);
        assert_eq!(m, 5.0);
        assert_eq!(std_dev(&v, m), 2.0);
    }

    #[test]
    fn test_histogram_bins() {
        assert_eq!(histogram_bins(0), 1);
        assert_eq!(histogram_bins(100), 10);
        assert_eq!(histogram_bins(101), 11);
        assert_eq!(histogram_bins(5_000), 71);
    }

    #[test]
    fn test_histogram_mode_picks_dense_bin() {
        // 9 values -> 3 bins over [0, 9]: [0,3) [3,6) [6,9]
        let mut v = vec![0.0, 4.0, 4.5, 5.0, 5.5, 5.9, 6.5, 8.0, 9.0];
        sort_values(&mut v);
        assert_eq!(histogram_mode(&v), 4.5);
    }

    #[test]
    fn test_histogram_mode_constant_sample() {
        assert_eq!(histogram_mode(&[3.0, 3.0, 3.0]), 3.0);
    }

    #[test]
    fn test_sample_stats_ordering() {
        let mut v: Vec<f64> = (0..1_000).map(|i| ((i * 7919) % 1_000) as f64).collect();
        sort_values(&mut v);
        let s = SampleStats::from_sorted(&v, 0.05, 0.95);
        assert!(s.min <= s.lower && s.lower <= s.median);
        assert!(s.median <= s.upper && s.upper <= s.max);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 999.0);
    }
}
