use std::collections::BTreeMap;

use crate::engine::{Dataset, EngineError};
use crate::schema;

/// Aggregates for one populated year of a trend series.
///
/// `count` is the number of non-null prices in the year; the year itself is
/// present as soon as any record falls in it, even one with a null price.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub year: i64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub count: usize,
}

/// Per-year price aggregates over `rows`, restricted to `[start_year,
/// end_year]`, ascending. Years with no matching record are omitted, not
/// zero-filled.
pub fn yearly_trend(
    dataset: &Dataset,
    rows: &[usize],
    start_year: i64,
    end_year: i64,
) -> Result<Vec<TrendPoint>, EngineError> {
    let years = dataset.i64_column(schema::CONTRACT_YEAR)?;
    let prices = dataset.f64_column(schema::PURCHASE_PRICE)?;

    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for &row in rows {
        let Some(year) = years[row] else { continue };
        if year < start_year || year > end_year {
            continue;
        }
        let bucket = buckets.entry(year).or_default();
        if let Some(price) = prices[row] {
            bucket.push(price);
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(year, values)| {
            let stats = crate::engine::ValueStats::from_values(values);
            TrendPoint {
                year,
                mean: stats.mean,
                median: stats.median,
                count: stats.count,
            }
        })
        .collect())
}

/// Percentage change in mean price between the first and last populated
/// entries of a trend series.
///
/// Fewer than two entries yields 0. A first-period mean that is absent or
/// zero makes the rate undefined, reported as `None` rather than letting an
/// infinity or NaN escape.
pub fn growth_rate(trend: &[TrendPoint]) -> Option<f64> {
    if trend.len() < 2 {
        return Some(0.0);
    }
    let first = trend.first()?.mean?;
    let last = trend.last()?.mean?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Column;

    fn trend_dataset() -> Dataset {
        Dataset::from_columns(vec![
            (
                schema::CONTRACT_YEAR.to_string(),
                Column::Int64(vec![
                    Some(2018),
                    Some(2018),
                    Some(2020),
                    Some(2021),
                    None,
                    Some(2020),
                ]),
            ),
            (
                schema::PURCHASE_PRICE.to_string(),
                Column::Float64(vec![
                    Some(400000.0),
                    Some(600000.0),
                    Some(800000.0),
                    Some(900000.0),
                    Some(123456.0),
                    None,
                ]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn gap_years_are_omitted_not_zero_filled() {
        let ds = trend_dataset();
        let rows: Vec<usize> = (0..ds.row_count()).collect();
        let trend = yearly_trend(&ds, &rows, 2018, 2020).unwrap();

        // 2019 has no records at all and does not appear
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].year, 2018);
        assert_eq!(trend[0].mean, Some(500000.0));
        assert_eq!(trend[0].count, 2);
        // 2020 has one priced record and one null-price record
        assert_eq!(trend[1].year, 2020);
        assert_eq!(trend[1].mean, Some(800000.0));
        assert_eq!(trend[1].count, 1);
    }

    #[test]
    fn growth_between_first_and_last_populated_years() {
        let ds = trend_dataset();
        let rows: Vec<usize> = (0..ds.row_count()).collect();
        let trend = yearly_trend(&ds, &rows, 2018, 2020).unwrap();
        // (800000 - 500000) / 500000 * 100
        assert_eq!(growth_rate(&trend), Some(60.0));
    }

    #[test]
    fn growth_is_zero_with_fewer_than_two_entries() {
        let ds = trend_dataset();
        let rows: Vec<usize> = (0..ds.row_count()).collect();
        let trend = yearly_trend(&ds, &rows, 2021, 2021).unwrap();
        assert_eq!(trend.len(), 1);
        assert_eq!(growth_rate(&trend), Some(0.0));

        assert_eq!(growth_rate(&[]), Some(0.0));
    }

    #[test]
    fn degenerate_first_period_mean_is_undefined_never_infinite() {
        let zero_first = vec![
            TrendPoint {
                year: 2018,
                mean: Some(0.0),
                median: Some(0.0),
                count: 1,
            },
            TrendPoint {
                year: 2019,
                mean: Some(100.0),
                median: Some(100.0),
                count: 1,
            },
        ];
        assert_eq!(growth_rate(&zero_first), None);

        let absent_first = vec![
            TrendPoint {
                year: 2018,
                mean: None,
                median: None,
                count: 0,
            },
            TrendPoint {
                year: 2019,
                mean: Some(100.0),
                median: Some(100.0),
                count: 1,
            },
        ];
        assert_eq!(growth_rate(&absent_first), None);
    }

    #[test]
    fn out_of_range_years_are_excluded() {
        let ds = trend_dataset();
        let rows: Vec<usize> = (0..ds.row_count()).collect();
        let trend = yearly_trend(&ds, &rows, 2019, 2020).unwrap();
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].year, 2020);
    }
}
