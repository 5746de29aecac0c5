//! The six query operations over a loaded dataset.
//!
//! Each operation translates its parameters into a [`Filter`], applies it
//! once to obtain a row subset, feeds the subset to the aggregation or trend
//! code, and shapes a serializable response. All numeric output is rounded
//! to two decimal places here and nowhere earlier; degenerate values
//! (division by zero, empty groups) surface as `None`, never as NaN or
//! infinity.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::stats::round2_opt;
use crate::engine::{
    group_stats, growth_rate, price_per_area, round2, top_n, yearly_trend, Dataset, EngineError,
    Filter, RankMetric, ValueStats,
};
use crate::schema;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Locality '{0}' not found")]
    LocalityNotFound(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

// -- Request parameters --

#[derive(Debug, Clone, Deserialize)]
pub struct AveragePriceQuery {
    pub locality: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub property_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceRangeQuery {
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketTrendsQuery {
    pub locality: String,
    pub start_year: i64,
    pub end_year: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopLocalitiesQuery {
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default = "default_top_limit")]
    pub limit: usize,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default)]
    pub property_type: Option<String>,
}

impl Default for TopLocalitiesQuery {
    fn default() -> Self {
        TopLocalitiesQuery {
            year: None,
            limit: default_top_limit(),
            sort_by: default_sort_by(),
            property_type: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuburbsQuery {
    #[serde(default = "default_suburb_limit")]
    pub limit: usize,
    #[serde(default)]
    pub search: Option<String>,
}

impl Default for SuburbsQuery {
    fn default() -> Self {
        SuburbsQuery {
            limit: default_suburb_limit(),
            search: None,
        }
    }
}

fn default_top_limit() -> usize {
    10
}

fn default_sort_by() -> String {
    "avg_price".to_string()
}

fn default_suburb_limit() -> usize {
    100
}

// -- Responses --

/// Structured "valid query, nothing matched" payload. Carried instead of an
/// error so a calling tool can tell an empty result from a failure.
#[derive(Debug, Clone, Serialize)]
pub struct NoData {
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AveragePriceResponse {
    Found(PriceSummary),
    NoData(NoData),
}

#[derive(Debug, Serialize)]
pub struct PriceSummary {
    pub locality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    pub average_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Every matching row, including those with a null price.
    pub total_sales: usize,
    pub price_per_sqm: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PriceRangeResponse {
    Found(RangeSummary),
    NoData(RangeNoData),
}

#[derive(Debug, Serialize)]
pub struct RangeNoData {
    pub note: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RangeSummary {
    pub total_properties: usize,
    pub average_price: Option<f64>,
    pub price_range: PriceBounds,
    pub top_localities: Vec<LocalityCount>,
}

#[derive(Debug, Serialize)]
pub struct PriceBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LocalityCount {
    pub locality: String,
    pub avg_price: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MarketTrendsResponse {
    Found(TrendSeries),
    NoData(NoData),
}

#[derive(Debug, Serialize)]
pub struct TrendSeries {
    pub locality: String,
    pub period: String,
    pub trends: Vec<TrendEntry>,
    /// Null when undefined (first populated year has an absent or zero mean).
    pub overall_growth_rate: Option<f64>,
    pub total_transactions: usize,
}

#[derive(Debug, Serialize)]
pub struct TrendEntry {
    pub year: i64,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub total_sales: usize,
}

#[derive(Debug, Serialize)]
pub struct TopLocalitiesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    pub sort_by: String,
    pub top_localities: Vec<RankedLocality>,
}

#[derive(Debug, Serialize)]
pub struct RankedLocality {
    pub locality: String,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub total_sales: usize,
}

#[derive(Debug, Serialize)]
pub struct LocalityStatsResponse {
    pub locality: String,
    pub total_sales: usize,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub std_deviation: Option<f64>,
    pub by_property_type: Vec<PropertyTypeStats>,
    pub recent_trends: Vec<YearMean>,
}

#[derive(Debug, Serialize)]
pub struct PropertyTypeStats {
    #[serde(rename = "type")]
    pub property_type: String,
    pub avg_price: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct YearMean {
    pub year: i64,
    pub avg_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SuburbList {
    pub total: usize,
    pub localities: Vec<String>,
}

/// The query façade. Wraps the one shared, read-only dataset; cloning is
/// cheap and every operation takes `&self`, so handlers on any number of
/// threads can run queries concurrently once loading has completed.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    dataset: Arc<Dataset>,
}

impl QueryEngine {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        QueryEngine { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Price statistics for one locality, optionally narrowed by contract
    /// year and property type.
    pub fn average_price(
        &self,
        query: &AveragePriceQuery,
    ) -> Result<AveragePriceResponse, EngineError> {
        let in_locality = Filter::new()
            .equals_ignore_case(schema::LOCALITY, &query.locality)
            .apply(&self.dataset)?;
        if in_locality.is_empty() {
            return Ok(AveragePriceResponse::NoData(NoData {
                note: format!("No data found for {}", query.locality),
                suggestion: Some(
                    "Check the spelling or list suburbs to see available localities".to_string(),
                ),
            }));
        }

        let mut filter = Filter::new();
        if let Some(year) = query.year {
            filter = filter.equals_int(schema::CONTRACT_YEAR, year);
        }
        if let Some(property_type) = &query.property_type {
            filter = filter.equals_ignore_case(schema::PRIMARY_PURPOSE, property_type);
        }
        let rows = if filter.is_empty() {
            in_locality
        } else {
            refine(&self.dataset, in_locality, filter)?
        };
        if rows.is_empty() {
            return Ok(AveragePriceResponse::NoData(NoData {
                note: "No matching records found with these filters".to_string(),
                suggestion: None,
            }));
        }

        let prices = self.collect_f64(schema::PURCHASE_PRICE, &rows)?;
        let areas = self.collect_f64(schema::AREA, &rows)?;
        let stats = ValueStats::from_values(prices);
        let mean_area = mean_of(&areas);
        debug!(
            "average_price: {} rows for '{}' ({} priced)",
            rows.len(),
            query.locality,
            stats.count
        );

        Ok(AveragePriceResponse::Found(PriceSummary {
            locality: query.locality.clone(),
            year: query.year,
            property_type: query.property_type.clone(),
            average_price: round2_opt(stats.mean),
            median_price: round2_opt(stats.median),
            min_price: round2_opt(stats.min),
            max_price: round2_opt(stats.max),
            total_sales: rows.len(),
            price_per_sqm: round2_opt(price_per_area(stats.mean, mean_area)),
        }))
    }

    /// Sales within a price range, summarized as the ten localities with the
    /// most sales in range.
    pub fn price_range(&self, query: &PriceRangeQuery) -> Result<PriceRangeResponse, EngineError> {
        let mut filter = Filter::new();
        if query.min_price.is_some() || query.max_price.is_some() {
            filter = filter.in_range(schema::PURCHASE_PRICE, query.min_price, query.max_price);
        }
        if let Some(locality) = &query.locality {
            filter = filter.equals_ignore_case(schema::LOCALITY, locality);
        }
        if let Some(year) = query.year {
            filter = filter.equals_int(schema::CONTRACT_YEAR, year);
        }

        let rows = filter.apply(&self.dataset)?;
        if rows.is_empty() {
            return Ok(PriceRangeResponse::NoData(RangeNoData {
                note: "No properties found in this price range".to_string(),
                count: 0,
            }));
        }

        let prices = self.collect_f64(schema::PURCHASE_PRICE, &rows)?;
        let overall_mean = mean_of(&prices);
        let groups = group_stats(&self.dataset, &rows, schema::LOCALITY, schema::PURCHASE_PRICE)?;
        let top = top_n(&groups, 10, RankMetric::Count);

        Ok(PriceRangeResponse::Found(RangeSummary {
            total_properties: rows.len(),
            average_price: round2_opt(overall_mean),
            price_range: PriceBounds {
                min: query.min_price,
                max: query.max_price,
            },
            top_localities: top
                .into_iter()
                .map(|(locality, stats)| LocalityCount {
                    locality,
                    avg_price: round2_opt(stats.mean),
                    count: stats.count,
                })
                .collect(),
        }))
    }

    /// Year-over-year price trend for a locality, with the overall growth
    /// rate between the first and last populated years.
    pub fn market_trends(
        &self,
        query: &MarketTrendsQuery,
    ) -> Result<MarketTrendsResponse, EngineError> {
        let rows = Filter::new()
            .equals_ignore_case(schema::LOCALITY, &query.locality)
            .in_range(
                schema::CONTRACT_YEAR,
                Some(query.start_year as f64),
                Some(query.end_year as f64),
            )
            .apply(&self.dataset)?;
        if rows.is_empty() {
            return Ok(MarketTrendsResponse::NoData(NoData {
                note: format!(
                    "No data found for {} between {}-{}",
                    query.locality, query.start_year, query.end_year
                ),
                suggestion: None,
            }));
        }

        let trend = yearly_trend(&self.dataset, &rows, query.start_year, query.end_year)?;
        // growth computed from unrounded means, rounded only for output
        let growth = growth_rate(&trend).map(round2);

        Ok(MarketTrendsResponse::Found(TrendSeries {
            locality: query.locality.clone(),
            period: format!("{}-{}", query.start_year, query.end_year),
            trends: trend
                .into_iter()
                .map(|point| TrendEntry {
                    year: point.year,
                    avg_price: round2_opt(point.mean),
                    median_price: round2_opt(point.median),
                    total_sales: point.count,
                })
                .collect(),
            overall_growth_rate: growth,
            total_transactions: rows.len(),
        }))
    }

    /// Localities ranked by average price, median price, or sales count.
    /// An unrecognized `sort_by` falls back to sales count.
    pub fn top_localities(
        &self,
        query: &TopLocalitiesQuery,
    ) -> Result<TopLocalitiesResponse, EngineError> {
        let mut filter = Filter::new();
        if let Some(year) = query.year {
            filter = filter.equals_int(schema::CONTRACT_YEAR, year);
        }
        if let Some(property_type) = &query.property_type {
            filter = filter.equals_ignore_case(schema::PRIMARY_PURPOSE, property_type);
        }
        let rows = filter.apply(&self.dataset)?;

        let (metric, sort_by) = match query.sort_by.as_str() {
            "avg_price" => (RankMetric::Mean, "avg_price"),
            "median_price" => (RankMetric::Median, "median_price"),
            _ => (RankMetric::Count, "total_sales"),
        };

        let groups = group_stats(&self.dataset, &rows, schema::LOCALITY, schema::PURCHASE_PRICE)?;
        let top = top_n(&groups, query.limit, metric);

        Ok(TopLocalitiesResponse {
            year: query.year,
            sort_by: sort_by.to_string(),
            top_localities: top
                .into_iter()
                .map(|(locality, stats)| RankedLocality {
                    locality,
                    avg_price: round2_opt(stats.mean),
                    median_price: round2_opt(stats.median),
                    total_sales: stats.count,
                })
                .collect(),
        })
    }

    /// Full statistics for one locality: overall prices, breakdown by
    /// property type, and the last five populated years of mean prices.
    ///
    /// This is the one specifically-addressed lookup: an unknown locality is
    /// a distinct not-found error, unlike the structured empty payloads of
    /// the filtered queries.
    pub fn locality_stats(&self, locality: &str) -> Result<LocalityStatsResponse, QueryError> {
        let rows = Filter::new()
            .equals_ignore_case(schema::LOCALITY, locality)
            .apply(&self.dataset)?;
        if rows.is_empty() {
            return Err(QueryError::LocalityNotFound(locality.to_string()));
        }

        let prices = self.collect_f64(schema::PURCHASE_PRICE, &rows)?;
        let stats = ValueStats::from_values(prices);

        let by_type = group_stats(
            &self.dataset,
            &rows,
            schema::PRIMARY_PURPOSE,
            schema::PURCHASE_PRICE,
        )?;

        let trend = yearly_trend(&self.dataset, &rows, i64::MIN, i64::MAX)?;
        let recent = trend.len().saturating_sub(5);

        Ok(LocalityStatsResponse {
            locality: locality.to_string(),
            total_sales: rows.len(),
            avg_price: round2_opt(stats.mean),
            median_price: round2_opt(stats.median),
            min_price: round2_opt(stats.min),
            max_price: round2_opt(stats.max),
            std_deviation: round2_opt(stats.std_dev),
            by_property_type: by_type
                .into_iter()
                .map(|(property_type, stats)| PropertyTypeStats {
                    property_type,
                    avg_price: round2_opt(stats.mean),
                    count: stats.count,
                })
                .collect(),
            recent_trends: trend[recent..]
                .iter()
                .map(|point| YearMean {
                    year: point.year,
                    avg_price: round2_opt(point.mean),
                })
                .collect(),
        })
    }

    /// Distinct locality names, alphabetical, optionally narrowed by a
    /// case-insensitive substring search and truncated to `limit`.
    pub fn list_suburbs(&self, query: &SuburbsQuery) -> Result<SuburbList, EngineError> {
        let localities = self.dataset.str_column(schema::LOCALITY)?;
        let needle = query.search.as_deref().map(str::to_lowercase);

        let distinct: BTreeSet<&String> = localities
            .iter()
            .flatten()
            .filter(|name| match &needle {
                Some(needle) => name.to_lowercase().contains(needle),
                None => true,
            })
            .collect();

        let names: Vec<String> = distinct
            .into_iter()
            .take(query.limit)
            .cloned()
            .collect();

        Ok(SuburbList {
            total: names.len(),
            localities: names,
        })
    }

    fn collect_f64(&self, column: &str, rows: &[usize]) -> Result<Vec<f64>, EngineError> {
        let col = self.dataset.f64_column(column)?;
        Ok(rows.iter().filter_map(|&i| col[i]).collect())
    }
}

fn refine(dataset: &Dataset, rows: Vec<usize>, filter: Filter) -> Result<Vec<usize>, EngineError> {
    // Intersect an existing subset with a further conjunction by checking
    // membership of the freshly filtered set; both sides are sorted
    // ascending since filters preserve row order.
    let further = filter.apply(dataset)?;
    let mut result = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < rows.len() && j < further.len() {
        match rows[i].cmp(&further[j]) {
            std::cmp::Ordering::Equal => {
                result.push(rows[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    Ok(result)
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Column;

    // Sydney rows 0..4 (one null price), Newcastle rows 4..6, Orange row 6.
    fn test_engine() -> QueryEngine {
        let some = |s: &str| Some(s.to_string());
        let dataset = Dataset::from_columns(vec![
            (
                schema::LOCALITY.to_string(),
                Column::Str(vec![
                    some("Sydney"),
                    some("Sydney"),
                    some("Sydney"),
                    some("Sydney"),
                    some("Newcastle"),
                    some("Newcastle"),
                    some("Orange"),
                ]),
            ),
            (
                schema::PRIMARY_PURPOSE.to_string(),
                Column::Str(vec![
                    some("Residence"),
                    some("Residence"),
                    some("Residence"),
                    some("Residence"),
                    some("Residence"),
                    some("Residence"),
                    some("Commercial"),
                ]),
            ),
            (
                schema::CONTRACT_YEAR.to_string(),
                Column::Int64(vec![
                    Some(2018),
                    Some(2020),
                    Some(2020),
                    Some(2020),
                    Some(2020),
                    Some(2020),
                    Some(2021),
                ]),
            ),
            (
                schema::PURCHASE_PRICE.to_string(),
                Column::Float64(vec![
                    Some(500000.0),
                    Some(600000.0),
                    Some(700000.0),
                    None,
                    Some(300000.0),
                    Some(350000.0),
                    Some(400000.0),
                ]),
            ),
            (
                schema::AREA.to_string(),
                Column::Float64(vec![Some(500.0); 7]),
            ),
        ])
        .unwrap();
        QueryEngine::new(Arc::new(dataset))
    }

    #[test]
    fn average_price_excludes_null_prices_but_counts_all_rows() {
        let engine = test_engine();
        let resp = engine
            .average_price(&AveragePriceQuery {
                locality: "Sydney".to_string(),
                year: None,
                property_type: None,
            })
            .unwrap();

        let AveragePriceResponse::Found(summary) = resp else {
            panic!("expected stats for Sydney");
        };
        assert_eq!(summary.average_price, Some(600000.0));
        assert_eq!(summary.median_price, Some(600000.0));
        assert_eq!(summary.min_price, Some(500000.0));
        assert_eq!(summary.max_price, Some(700000.0));
        // the null-price row still counts as a sale
        assert_eq!(summary.total_sales, 4);
        assert_eq!(summary.price_per_sqm, Some(1200.0));
    }

    #[test]
    fn average_price_distinguishes_unknown_locality_from_empty_filter() {
        let engine = test_engine();

        let unknown = engine
            .average_price(&AveragePriceQuery {
                locality: "Melbourne".to_string(),
                year: None,
                property_type: None,
            })
            .unwrap();
        let AveragePriceResponse::NoData(no_data) = unknown else {
            panic!("expected no data");
        };
        assert!(no_data.suggestion.is_some());

        let empty_after_filter = engine
            .average_price(&AveragePriceQuery {
                locality: "Sydney".to_string(),
                year: Some(1999),
                property_type: None,
            })
            .unwrap();
        let AveragePriceResponse::NoData(no_data) = empty_after_filter else {
            panic!("expected no data");
        };
        assert!(no_data.suggestion.is_none());
    }

    #[test]
    fn average_price_serializes_without_nan() {
        let engine = test_engine();
        let resp = engine
            .average_price(&AveragePriceQuery {
                locality: "sydney".to_string(),
                year: None,
                property_type: None,
            })
            .unwrap();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["average_price"], 600000.0);
        assert_eq!(json["total_sales"], 4);
        // optional filters not echoed when absent
        assert!(json.get("year").is_none());
    }

    #[test]
    fn price_range_ranks_localities_by_count() {
        let engine = test_engine();
        let resp = engine
            .price_range(&PriceRangeQuery {
                min_price: Some(300000.0),
                max_price: Some(500000.0),
                locality: None,
                year: None,
            })
            .unwrap();

        let PriceRangeResponse::Found(summary) = resp else {
            panic!("expected matches in range");
        };
        assert_eq!(summary.total_properties, 4);
        assert_eq!(summary.average_price, Some(387500.0));
        let names: Vec<&str> = summary
            .top_localities
            .iter()
            .map(|l| l.locality.as_str())
            .collect();
        // Newcastle has 2 in-range sales; Sydney and Orange tie on 1 and
        // keep dataset encounter order
        assert_eq!(names, vec!["Newcastle", "Sydney", "Orange"]);
        assert_eq!(summary.top_localities[0].count, 2);
    }

    #[test]
    fn price_range_empty_is_count_zero_not_error() {
        let engine = test_engine();
        let resp = engine
            .price_range(&PriceRangeQuery {
                min_price: Some(10.0),
                max_price: Some(20.0),
                locality: None,
                year: None,
            })
            .unwrap();
        let PriceRangeResponse::NoData(no_data) = resp else {
            panic!("expected empty result");
        };
        assert_eq!(no_data.count, 0);
    }

    #[test]
    fn market_trends_omits_gap_years_and_reports_growth() {
        let engine = test_engine();
        let resp = engine
            .market_trends(&MarketTrendsQuery {
                locality: "Sydney".to_string(),
                start_year: 2018,
                end_year: 2020,
            })
            .unwrap();

        let MarketTrendsResponse::Found(series) = resp else {
            panic!("expected trend data");
        };
        assert_eq!(series.period, "2018-2020");
        // 2019 has no Sydney records and is omitted
        assert_eq!(series.trends.len(), 2);
        assert_eq!(series.trends[0].year, 2018);
        assert_eq!(series.trends[0].avg_price, Some(500000.0));
        assert_eq!(series.trends[1].year, 2020);
        assert_eq!(series.trends[1].avg_price, Some(650000.0));
        // null-price 2020 row contributes to transactions but not the mean
        assert_eq!(series.trends[1].total_sales, 2);
        assert_eq!(series.total_transactions, 4);
        // (650000 - 500000) / 500000 * 100
        assert_eq!(series.overall_growth_rate, Some(30.0));
    }

    #[test]
    fn top_localities_sorts_by_requested_metric() {
        let engine = test_engine();
        let resp = engine
            .top_localities(&TopLocalitiesQuery::default())
            .unwrap();
        assert_eq!(resp.sort_by, "avg_price");
        let names: Vec<&str> = resp
            .top_localities
            .iter()
            .map(|l| l.locality.as_str())
            .collect();
        assert_eq!(names, vec!["Sydney", "Orange", "Newcastle"]);
    }

    #[test]
    fn top_localities_unknown_sort_falls_back_to_sales() {
        let engine = test_engine();
        let resp = engine
            .top_localities(&TopLocalitiesQuery {
                sort_by: "bogus".to_string(),
                ..TopLocalitiesQuery::default()
            })
            .unwrap();
        assert_eq!(resp.sort_by, "total_sales");
        assert_eq!(resp.top_localities[0].locality, "Sydney");
        assert_eq!(resp.top_localities[0].total_sales, 3);
    }

    #[test]
    fn top_localities_respects_limit_and_filters() {
        let engine = test_engine();
        let resp = engine
            .top_localities(&TopLocalitiesQuery {
                limit: 1,
                property_type: Some("commercial".to_string()),
                ..TopLocalitiesQuery::default()
            })
            .unwrap();
        assert_eq!(resp.top_localities.len(), 1);
        assert_eq!(resp.top_localities[0].locality, "Orange");
    }

    #[test]
    fn locality_stats_reports_breakdown_and_recent_trend() {
        let engine = test_engine();
        let resp = engine.locality_stats("SYDNEY").unwrap();

        assert_eq!(resp.total_sales, 4);
        assert_eq!(resp.avg_price, Some(600000.0));
        assert_eq!(resp.std_deviation, Some(100000.0));
        assert_eq!(resp.by_property_type.len(), 1);
        assert_eq!(resp.by_property_type[0].property_type, "Residence");
        assert_eq!(resp.by_property_type[0].count, 3);

        let years: Vec<i64> = resp.recent_trends.iter().map(|t| t.year).collect();
        assert_eq!(years, vec![2018, 2020]);
    }

    #[test]
    fn locality_stats_unknown_is_not_found() {
        let engine = test_engine();
        let err = engine.locality_stats("Atlantis").unwrap_err();
        assert!(matches!(err, QueryError::LocalityNotFound(l) if l == "Atlantis"));
    }

    #[test]
    fn query_parameters_deserialize_with_defaults() {
        let q: TopLocalitiesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 10);
        assert_eq!(q.sort_by, "avg_price");
        assert_eq!(q.year, None);

        let q: SuburbsQuery = serde_json::from_str(r#"{"search":"syd"}"#).unwrap();
        assert_eq!(q.limit, 100);
        assert_eq!(q.search.as_deref(), Some("syd"));
    }

    #[test]
    fn list_suburbs_searches_sorts_and_truncates() {
        let engine = test_engine();

        let all = engine.list_suburbs(&SuburbsQuery::default()).unwrap();
        assert_eq!(all.localities, vec!["Newcastle", "Orange", "Sydney"]);
        assert_eq!(all.total, 3);

        let searched = engine
            .list_suburbs(&SuburbsQuery {
                limit: 100,
                search: Some("SYD".to_string()),
            })
            .unwrap();
        assert_eq!(searched.localities, vec!["Sydney"]);

        let truncated = engine
            .list_suburbs(&SuburbsQuery {
                limit: 2,
                search: None,
            })
            .unwrap();
        assert_eq!(truncated.localities, vec!["Newcastle", "Orange"]);
    }
}
