use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::chart::constants::CUSUM_WEIGHT_FACTOR;

/// Reference statistics for a guide set training window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuideSetStats {
    pub mean: f64,
    pub std_dev: f64,
    pub num_records: usize,
}

/// Computes the mean and sample standard deviation of a training window.
/// A window with fewer than two records has a standard deviation of zero,
/// an empty window yields no statistics at all.
pub fn guide_set_stats(values: &[f64]) -> Option<GuideSetStats> {
    if values.is_empty() {
        return None;
    }
    let mean = values.mean();
    let std_dev = if values.len() < 2 { 0.0 } else { values.std_dev() };
    Some(GuideSetStats { mean, std_dev, num_records: values.len() })
}

/// Moving ranges of consecutive observations. The first observation has no
/// predecessor and therefore no moving range.
pub fn moving_ranges(values: &[f64]) -> Vec<Option<f64>> {
    let mut ranges = Vec::with_capacity(values.len());
    if !values.is_empty() {
        ranges.push(None);
        ranges.extend(values.iter().tuple_windows().map(|(a, b)| Some((b - a).abs())));
    }
    ranges
}

/// Positive and negative CUSUM channels for one series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CusumSeries {
    pub positive: Vec<f64>,
    pub negative: Vec<f64>,
}

/// Standardized CUSUM channels against an explicit baseline:
/// `S+ = max(0, z - k + S+_prev)` and `S- = max(0, -k - z + S-_prev)` with
/// `k = CUSUM_WEIGHT_FACTOR`. A zero standard deviation standardizes every
/// observation to zero deviation.
pub fn cusum_series_with_baseline(values: &[f64], mean: f64, std_dev: f64) -> CusumSeries {
    let mut series = CusumSeries {
        positive: Vec::with_capacity(values.len()),
        negative: Vec::with_capacity(values.len()),
    };
    let mut positive = 0.0_f64;
    let mut negative = 0.0_f64;
    for value in values {
        let z = if std_dev == 0.0 { 0.0 } else { (value - mean) / std_dev };
        positive = (z - CUSUM_WEIGHT_FACTOR + positive).max(0.0);
        negative = (-CUSUM_WEIGHT_FACTOR - z + negative).max(0.0);
        series.positive.push(positive);
        series.negative.push(negative);
    }
    series
}

/// CUSUM channels standardized against the series' own mean and standard
/// deviation, the baseline used when no guide set is in effect.
pub fn cusum_series(values: &[f64]) -> CusumSeries {
    match guide_set_stats(values) {
        Some(stats) => cusum_series_with_baseline(values, stats.mean, stats.std_dev),
        None => CusumSeries::default(),
    }
}
