use std::collections::HashMap;

use crate::engine::{Dataset, EngineError};

/// Statistics over the non-null values of one group.
///
/// `count` is the number of non-null values; a group whose every value is
/// null is reported with `count == 0` and absent numerics, never zeros.
/// `std_dev` is the sample standard deviation (n − 1 denominator) and is
/// absent when fewer than two values exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std_dev: Option<f64>,
}

impl ValueStats {
    pub fn from_values(mut values: Vec<f64>) -> Self {
        let count = values.len();
        if count == 0 {
            return ValueStats {
                count: 0,
                mean: None,
                median: None,
                min: None,
                max: None,
                std_dev: None,
            };
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;
        let median = if count % 2 == 1 {
            values[count / 2]
        } else {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        };
        let std_dev = if count >= 2 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            Some(var.sqrt())
        } else {
            None
        };

        ValueStats {
            count,
            mean: Some(mean),
            median: Some(median),
            min: Some(values[0]),
            max: Some(values[count - 1]),
            std_dev,
        }
    }
}

/// Metric used to rank groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Mean,
    Median,
    Count,
}

impl RankMetric {
    fn value(&self, stats: &ValueStats) -> Option<f64> {
        match self {
            RankMetric::Mean => stats.mean,
            RankMetric::Median => stats.median,
            RankMetric::Count => Some(stats.count as f64),
        }
    }
}

/// Grouped statistics of `value_column` over the given row subset, bucketed
/// by `group_column`.
///
/// Groups appear in first-encountered row order; rows with a null group key
/// are skipped entirely, rows with a null value contribute to the group's
/// existence but not to its statistics.
pub fn group_stats(
    dataset: &Dataset,
    rows: &[usize],
    group_column: &str,
    value_column: &str,
) -> Result<Vec<(String, ValueStats)>, EngineError> {
    let keys = dataset.str_column(group_column)?;
    let values = dataset.f64_column(value_column)?;

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<f64>> = HashMap::new();
    for &row in rows {
        let Some(key) = &keys[row] else { continue };
        if !buckets.contains_key(key) {
            order.push(key.clone());
        }
        let bucket = buckets.entry(key.clone()).or_default();
        if let Some(v) = values[row] {
            bucket.push(v);
        }
    }

    Ok(order
        .into_iter()
        .map(|key| {
            let values = buckets.remove(&key).unwrap_or_default();
            let stats = ValueStats::from_values(values);
            (key, stats)
        })
        .collect())
}

/// The `n` groups with the largest value of `metric`, descending.
///
/// The sort is stable: tied groups keep their first-encountered order from
/// `group_stats`. Groups whose metric is absent rank below all others.
pub fn top_n(
    groups: &[(String, ValueStats)],
    n: usize,
    metric: RankMetric,
) -> Vec<(String, ValueStats)> {
    let mut ranked: Vec<&(String, ValueStats)> = groups.iter().collect();
    ranked.sort_by(|a, b| {
        let (av, bv) = (metric.value(&a.1), metric.value(&b.1));
        match (av, bv) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
    ranked.into_iter().take(n).cloned().collect()
}

/// Mean price per unit area; absent unless the mean area is positive.
pub fn price_per_area(mean_price: Option<f64>, mean_area: Option<f64>) -> Option<f64> {
    match (mean_price, mean_area) {
        (Some(p), Some(a)) if a > 0.0 => Some(p / a),
        _ => None,
    }
}

/// Presentation-time rounding to 2 decimal places. Applied exactly once, at
/// the query façade; intermediate computation always uses full precision.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn round2_opt(v: Option<f64>) -> Option<f64> {
    v.map(round2)
}
