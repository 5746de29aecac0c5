use rayon::prelude::*;

use crate::engine::{Column, Dataset, EngineError};

/// A single predicate over one dataset column.
///
/// Null column values never match any predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive string equality.
    EqualsIgnoreCase { column: String, value: String },
    /// Inclusive numeric range; an absent bound is unbounded on that side.
    InRange {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Exact integer equality (contract year).
    EqualsInt { column: String, value: i64 },
}

/// A conjunction of predicates. Applying zero predicates selects every row.
///
/// This is the single mechanism all query operations funnel through: each
/// request builds a `Filter`, applies it once, and hands the resulting row
/// subset to the aggregation or trend code.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn equals_ignore_case(mut self, column: &str, value: &str) -> Self {
        self.predicates.push(Predicate::EqualsIgnoreCase {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn in_range(mut self, column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.predicates.push(Predicate::InRange {
            column: column.to_string(),
            min,
            max,
        });
        self
    }

    pub fn equals_int(mut self, column: &str, value: i64) -> Self {
        self.predicates.push(Predicate::EqualsInt {
            column: column.to_string(),
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Apply the conjunction, producing an order-preserving row subset.
    ///
    /// The first predicate scans its full column in parallel; subsequent
    /// predicates only re-check the rows that survived so far.
    pub fn apply(&self, dataset: &Dataset) -> Result<Vec<usize>, EngineError> {
        let mut rows: Option<Vec<usize>> = None;
        for predicate in &self.predicates {
            let next = match rows {
                None => predicate.scan(dataset)?,
                Some(subset) => predicate.refine(dataset, subset)?,
            };
            if next.is_empty() {
                return Ok(Vec::new());
            }
            rows = Some(next);
        }
        Ok(rows.unwrap_or_else(|| (0..dataset.row_count()).collect()))
    }
}

impl Predicate {
    /// Full-column scan over the dataset.
    fn scan(&self, dataset: &Dataset) -> Result<Vec<usize>, EngineError> {
        match self {
            Predicate::EqualsIgnoreCase { column, value } => {
                let col = dataset.str_column(column)?;
                let needle = value.to_lowercase();
                Ok(col
                    .par_iter()
                    .enumerate()
                    .filter_map(|(i, v)| match v {
                        Some(s) if s.to_lowercase() == needle => Some(i),
                        _ => None,
                    })
                    .collect())
            }
            Predicate::InRange { column, min, max } => match dataset.column(column)? {
                Column::Float64(col) => Ok(col
                    .par_iter()
                    .enumerate()
                    .filter_map(|(i, v)| match v {
                        Some(v) if in_bounds(*v, *min, *max) => Some(i),
                        _ => None,
                    })
                    .collect()),
                Column::Int64(col) => Ok(col
                    .par_iter()
                    .enumerate()
                    .filter_map(|(i, v)| match v {
                        Some(v) if in_bounds(*v as f64, *min, *max) => Some(i),
                        _ => None,
                    })
                    .collect()),
                _ => Err(numeric_type_error(column)),
            },
            Predicate::EqualsInt { column, value } => {
                let col = dataset.i64_column(column)?;
                Ok(col
                    .par_iter()
                    .enumerate()
                    .filter_map(|(i, v)| (*v == Some(*value)).then_some(i))
                    .collect())
            }
        }
    }

    /// Keep only the rows of `subset` that also satisfy this predicate.
    fn refine(&self, dataset: &Dataset, subset: Vec<usize>) -> Result<Vec<usize>, EngineError> {
        match self {
            Predicate::EqualsIgnoreCase { column, value } => {
                let col = dataset.str_column(column)?;
                let needle = value.to_lowercase();
                Ok(subset
                    .into_iter()
                    .filter(|&i| {
                        matches!(&col[i], Some(s) if s.to_lowercase() == needle)
                    })
                    .collect())
            }
            Predicate::InRange { column, min, max } => match dataset.column(column)? {
                Column::Float64(col) => Ok(subset
                    .into_iter()
                    .filter(|&i| matches!(col[i], Some(v) if in_bounds(v, *min, *max)))
                    .collect()),
                Column::Int64(col) => Ok(subset
                    .into_iter()
                    .filter(|&i| matches!(col[i], Some(v) if in_bounds(v as f64, *min, *max)))
                    .collect()),
                _ => Err(numeric_type_error(column)),
            },
            Predicate::EqualsInt { column, value } => {
                let col = dataset.i64_column(column)?;
                Ok(subset
                    .into_iter()
                    .filter(|&i| col[i] == Some(*value))
                    .collect())
            }
        }
    }
}

fn numeric_type_error(column: &str) -> EngineError {
    EngineError::ColumnType {
        column: column.to_string(),
        expected: "numeric",
    }
}

fn in_bounds(v: f64, min: Option<f64>, max: Option<f64>) -> bool {
    if let Some(lo) = min {
        if v < lo {
            return false;
        }
    }
    if let Some(hi) = max {
        if v > hi {
            return false;
        }
    }
    true
}
