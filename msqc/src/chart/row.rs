use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One quality control observation as returned by the upstream query service.
///
/// All numeric fields are optional: the query layer reports missing metric
/// values, missing guide set statistics and missing CUSUM channels as nulls.
/// Rows are immutable once produced, the range tracker only reads them.
///
/// # Example
///
/// ```rust
/// use msqc::chart::row::MetricRow;
/// let row = MetricRow { value: Some(10.0), ..Default::default() };
/// assert_eq!(row.value, Some(10.0));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricRow {
    /// Observed metric value (Levey-Jennings and moving range channels).
    pub value: Option<f64>,
    /// Guide set mean for the enclosing training window.
    pub mean: Option<f64>,
    /// Guide set standard deviation for the enclosing training window.
    pub std_dev: Option<f64>,
    /// First parallel sub-series value for dual-series metric configurations.
    pub value_series1: Option<f64>,
    /// Second parallel sub-series value for dual-series metric configurations.
    pub value_series2: Option<f64>,
    /// CUSUM positive deviation channel.
    pub positive: Option<f64>,
    /// CUSUM negative deviation channel.
    pub negative: Option<f64>,
}

/// Treats NaN and infinite values as missing, mirroring how the upstream
/// layer reports unusable numbers. "Wrong type" inputs never reach this
/// crate, they are nulls by the time rows are deserialized.
pub fn valid_number(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl MetricRow {
    pub fn from_value(value: f64) -> Self {
        MetricRow { value: Some(value), ..Default::default() }
    }

    pub fn with_guide_set(value: f64, mean: f64, std_dev: f64) -> Self {
        MetricRow {
            value: Some(value),
            mean: Some(mean),
            std_dev: Some(std_dev),
            ..Default::default()
        }
    }
}
