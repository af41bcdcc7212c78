use bincode::{Decode, Encode};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::chart::constants::{
    DEFAULT_AXIS_MAX, DEFAULT_AXIS_MIN, DEGENERATE_RANGE_EPSILON, GUIDE_SET_BAND_WIDTH,
    MOVING_RANGE_UPPER_LIMIT_WEIGHT,
};
use crate::chart::row::{valid_number, MetricRow};

/// Control-chart channel a series is rendered on.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize, Encode, Decode)]
pub enum SeriesChannel {
    LeveyJennings,
    Cusum,
    MovingRange,
}

impl Display for SeriesChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SeriesChannel::LeveyJennings => write!(f, "LeveyJennings"),
            SeriesChannel::Cusum => write!(f, "Cusum"),
            SeriesChannel::MovingRange => write!(f, "MovingRange"),
        }
    }
}

/// Per-batch folding options, owned by the caller for the duration of one
/// series' row batch.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Encode, Decode)]
pub struct FoldOptions {
    /// The y axis is currently set to a logarithmic scale.
    pub log_scale: bool,
    /// The metric configuration defines two parallel sub-series.
    pub multi_series: bool,
}

impl FoldOptions {
    pub fn new(log_scale: bool, multi_series: bool) -> Self {
        FoldOptions { log_scale, multi_series }
    }
}

/// Accumulated y-axis range for one plot series.
///
/// `min` only ever decreases and `max` only ever increases as rows are folded
/// in, so accumulation is commutative and associative and row order does not
/// affect the final range. `log_invalid` records that a plotted value was
/// non-positive while log scale was active, `log_warning` that a guide set
/// band's lower bound had to be clipped to stay positive under log scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SeriesRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub log_invalid: bool,
    pub log_warning: bool,
}

impl SeriesRange {
    pub fn new() -> Self {
        SeriesRange::default()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn expand_min(&mut self, value: f64) {
        self.min = Some(match self.min {
            Some(min) => min.min(value),
            None => value,
        });
    }

    pub fn expand_max(&mut self, value: f64) {
        self.max = Some(match self.max {
            Some(max) => max.max(value),
            None => value,
        });
    }

    /// Folds a plotted value into the range, flagging non-positive values
    /// when the axis is logarithmic.
    pub fn observe(&mut self, value: f64, log_scale: bool) {
        self.expand_min(value);
        self.expand_max(value);
        if log_scale && value <= 0.0 {
            self.log_invalid = true;
        }
    }

    /// Merges another accumulator into this one.
    pub fn union(&mut self, other: &SeriesRange) {
        if let Some(min) = other.min {
            self.expand_min(min);
        }
        if let Some(max) = other.max {
            self.expand_max(max);
        }
        self.log_invalid |= other.log_invalid;
        self.log_warning |= other.log_warning;
    }

    /// Folds one Levey-Jennings row: the plotted value, the guide set band
    /// `mean +/- 3 * std_dev`, and the dual-series log diagnostic.
    pub fn fold_levey_jennings(&mut self, row: &MetricRow, options: &FoldOptions) {
        if let Some(value) = valid_number(row.value) {
            self.observe(value, options.log_scale);
        } else if options.multi_series && options.log_scale {
            // Dual-series rows carry no single value, the sub-series are only
            // checked for log validity, they do not move min/max here.
            for sub in [row.value_series1, row.value_series2] {
                if let Some(v) = valid_number(sub) {
                    if v <= 0.0 {
                        self.log_invalid = true;
                    }
                }
            }
        }

        if let Some(mean) = valid_number(row.mean) {
            let std_dev = valid_number(row.std_dev).unwrap_or(0.0);
            let upper = mean + GUIDE_SET_BAND_WIDTH as f64 * std_dev;
            let lower = mean - GUIDE_SET_BAND_WIDTH as f64 * std_dev;
            self.expand_max(upper);

            if !self.log_invalid && options.log_scale && lower <= 0.0 {
                self.log_warning = true;
                if let Some(adjusted) = clipped_lower_band(mean, std_dev) {
                    self.expand_min(adjusted);
                }
            } else {
                self.expand_min(lower);
            }
        }
    }

    /// Folds one moving range row. The upper bound additionally covers the
    /// moving range control limit `mean * MOVING_RANGE_UPPER_LIMIT_WEIGHT`.
    pub fn fold_moving_range(&mut self, row: &MetricRow, options: &FoldOptions) {
        if let Some(value) = valid_number(row.value) {
            self.observe(value, options.log_scale);
        }
        if let Some(mean) = valid_number(row.mean) {
            self.expand_max(mean * MOVING_RANGE_UPPER_LIMIT_WEIGHT);
        }
    }

    /// Finalizes the accumulated range into a concrete axis domain.
    ///
    /// An empty range falls back to `[0, 1]`. A near-degenerate range is
    /// widened symmetrically, by 0.1 when the maximum is below 0.1, by 1
    /// otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use msqc::chart::range::SeriesRange;
    /// let mut range = SeriesRange::new();
    /// range.expand_min(5.0);
    /// range.expand_max(5.0);
    /// let domain = range.axis_domain();
    /// assert_eq!((domain.min, domain.max), (4.0, 6.0));
    /// ```
    pub fn axis_domain(&self) -> AxisDomain {
        let (mut min, mut max) = match (self.min, self.max) {
            (None, None) => (DEFAULT_AXIS_MIN, DEFAULT_AXIS_MAX),
            (Some(min), Some(max)) => (min, max),
            (Some(min), None) => (min, min),
            (None, Some(max)) => (max, max),
        };

        if max - min < DEGENERATE_RANGE_EPSILON {
            let pad = if max < 0.1 { 0.1 } else { 1.0 };
            min -= pad;
            max += pad;
        }

        AxisDomain { min, max }
    }
}

/// Largest band width `k` below the full guide set band such that
/// `mean - k * std_dev` stays positive, searched from `k = 2` down to `k = 0`.
/// Returns `None` when even the mean itself is non-positive.
fn clipped_lower_band(mean: f64, std_dev: f64) -> Option<f64> {
    (0..GUIDE_SET_BAND_WIDTH)
        .rev()
        .map(|k| mean - k as f64 * std_dev)
        .find(|band| *band > 0.0)
}

/// CUSUM series track the negative and positive deviation channels as two
/// independent sub-ranges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CusumRange {
    pub negative: SeriesRange,
    pub positive: SeriesRange,
}

impl CusumRange {
    pub fn new() -> Self {
        CusumRange::default()
    }

    pub fn fold(&mut self, row: &MetricRow, options: &FoldOptions) {
        if let Some(value) = valid_number(row.negative) {
            self.negative.observe(value, options.log_scale);
        }
        if let Some(value) = valid_number(row.positive) {
            self.positive.observe(value, options.log_scale);
        }
    }

    /// Union of both channels, covering the full y extent of the series.
    pub fn combined(&self) -> SeriesRange {
        let mut combined = self.negative;
        combined.union(&self.positive);
        combined
    }
}

/// Per-series range accumulator, dispatched by control-chart channel.
///
/// One tracker is created per logical plot series, fed every row of the
/// series' batch and finalized once the batch completes. Trackers are never
/// shared across series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum SeriesRangeTracker {
    LeveyJennings(SeriesRange),
    Cusum(CusumRange),
    MovingRange(SeriesRange),
}

impl SeriesRangeTracker {
    pub fn new(channel: SeriesChannel) -> Self {
        match channel {
            SeriesChannel::LeveyJennings => SeriesRangeTracker::LeveyJennings(SeriesRange::new()),
            SeriesChannel::Cusum => SeriesRangeTracker::Cusum(CusumRange::new()),
            SeriesChannel::MovingRange => SeriesRangeTracker::MovingRange(SeriesRange::new()),
        }
    }

    pub fn fold(&mut self, row: &MetricRow, options: &FoldOptions) {
        match self {
            SeriesRangeTracker::LeveyJennings(range) => range.fold_levey_jennings(row, options),
            SeriesRangeTracker::Cusum(range) => range.fold(row, options),
            SeriesRangeTracker::MovingRange(range) => range.fold_moving_range(row, options),
        }
    }

    pub fn finish(self) -> SeriesRange {
        match self {
            SeriesRangeTracker::LeveyJennings(range) => range,
            SeriesRangeTracker::Cusum(range) => range.combined(),
            SeriesRangeTracker::MovingRange(range) => range,
        }
    }
}

/// Folds a whole row batch for one series and finalizes the range.
pub fn fold_rows(rows: &[MetricRow], channel: SeriesChannel, options: &FoldOptions) -> SeriesRange {
    let mut tracker = SeriesRangeTracker::new(channel);
    for row in rows {
        tracker.fold(row, options);
    }
    tracker.finish()
}

/// Parallel batch fold. Range accumulation is commutative and associative,
/// so chunked folding followed by a union reduce yields the same min/max as
/// the sequential fold.
pub fn fold_rows_par(
    rows: &[MetricRow],
    channel: SeriesChannel,
    options: &FoldOptions,
    num_threads: usize,
) -> SeriesRange {
    let pool = ThreadPoolBuilder::new().num_threads(num_threads).build().unwrap();
    pool.install(|| {
        rows.par_iter()
            .fold(
                || SeriesRangeTracker::new(channel),
                |mut tracker, row| {
                    tracker.fold(row, options);
                    tracker
                },
            )
            .map(|tracker| tracker.finish())
            .reduce(SeriesRange::new, |mut acc, range| {
                acc.union(&range);
                acc
            })
    })
}

/// Concrete `[min, max]` domain handed to the charting layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct AxisDomain {
    pub min: f64,
    pub max: f64,
}
