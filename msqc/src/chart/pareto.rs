use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// One bar of a Pareto panel: an outlier count for a metric category plus
/// the cumulative percentage of all outliers up to and including this bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParetoPoint {
    pub category: String,
    pub count: u64,
    pub cumulative_percent: f64,
}

/// Ranks outlier counts per category in descending order and attaches
/// cumulative percentages. Ties rank alphabetically by category so the
/// ordering is deterministic.
pub fn rank_pareto(counts: &[(String, u64)]) -> Vec<ParetoPoint> {
    let total: u64 = counts.iter().map(|(_, count)| count).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&(String, u64)> = counts.iter().collect();
    ordered.sort_by_key(|(category, count)| (Reverse(*count), category.clone()));

    let mut running = 0_u64;
    ordered
        .into_iter()
        .map(|(category, count)| {
            running += count;
            ParetoPoint {
                category: category.clone(),
                count: *count,
                cumulative_percent: running as f64 / total as f64 * 100.0,
            }
        })
        .collect()
}
