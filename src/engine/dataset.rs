use std::fs::File;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, Datelike, NaiveDate};
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::engine::{Column, EngineError};
use crate::schema;

/// The loaded dataset: named, typed, nullable columns of equal length.
///
/// Populated exactly once from a columnar snapshot and read-only afterwards;
/// every query operation works against `&Dataset` and allocates only row
/// index lists, never a copy of the column data.
#[derive(Debug)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from already-materialized columns.
    ///
    /// All columns must have the same length. This is the constructor used
    /// by tests and by the snapshot loader once extraction is done.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self, EngineError> {
        let row_count = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        for (name, col) in &columns {
            if col.len() != row_count {
                return Err(EngineError::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    col.len(),
                    row_count
                )));
            }
        }
        let (names, columns) = columns.into_iter().unzip();
        Ok(Dataset {
            names,
            columns,
            row_count,
        })
    }

    /// Load a property-sales snapshot from a parquet file.
    ///
    /// Validates the required schema up front, normalises header whitespace,
    /// and derives `Contract year` / `Contract month` from the contract date
    /// when the snapshot does not carry them. Rows are never dropped:
    /// unparsable dates or numbers become nulls in the affected column.
    pub fn from_parquet(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let file_schema = builder.schema().clone();

        let index_of = |name: &str| {
            file_schema
                .fields()
                .iter()
                .position(|f| f.name().trim() == name)
        };
        for required in schema::REQUIRED {
            if index_of(required).is_none() {
                return Err(EngineError::MissingColumn((*required).to_string()));
            }
        }
        let require =
            |name: &str| index_of(name).ok_or_else(|| EngineError::MissingColumn(name.to_string()));
        let locality_idx = require(schema::LOCALITY)?;
        let purpose_idx = require(schema::PRIMARY_PURPOSE)?;
        let date_idx = require(schema::CONTRACT_DATE)?;
        let price_idx = require(schema::PURCHASE_PRICE)?;
        let area_idx = require(schema::AREA)?;
        let postcode_idx = require(schema::POST_CODE)?;
        // Pre-computed by the conversion job in current snapshots; derived
        // below when absent.
        let year_idx = index_of(schema::CONTRACT_YEAR);
        let month_idx = index_of(schema::CONTRACT_MONTH);
        debug!(
            "snapshot schema validated ({} fields, year column {})",
            file_schema.fields().len(),
            if year_idx.is_some() {
                "present"
            } else {
                "derived"
            }
        );

        let mut locality: Vec<Option<String>> = Vec::new();
        let mut purpose: Vec<Option<String>> = Vec::new();
        let mut dates: Vec<Option<NaiveDate>> = Vec::new();
        let mut price: Vec<Option<f64>> = Vec::new();
        let mut area: Vec<Option<f64>> = Vec::new();
        let mut postcode: Vec<Option<f64>> = Vec::new();
        let mut years: Vec<Option<i64>> = Vec::new();
        let mut months: Vec<Option<i64>> = Vec::new();

        let reader = builder.build()?;
        for batch in reader {
            let batch = batch?;
            locality.extend(str_values(batch.column(locality_idx), schema::LOCALITY)?);
            purpose.extend(str_values(
                batch.column(purpose_idx),
                schema::PRIMARY_PURPOSE,
            )?);
            dates.extend(date_values(batch.column(date_idx), schema::CONTRACT_DATE)?);
            price.extend(f64_values(batch.column(price_idx), schema::PURCHASE_PRICE)?);
            area.extend(f64_values(batch.column(area_idx), schema::AREA)?);
            postcode.extend(f64_values(batch.column(postcode_idx), schema::POST_CODE)?);
            if let Some(idx) = year_idx {
                years.extend(i64_values(batch.column(idx), schema::CONTRACT_YEAR)?);
            }
            if let Some(idx) = month_idx {
                months.extend(i64_values(batch.column(idx), schema::CONTRACT_MONTH)?);
            }
        }

        // Derived columns: computed once at load, null where the date is null.
        if year_idx.is_none() {
            years = dates.iter().map(|d| d.map(|d| d.year() as i64)).collect();
        }
        if month_idx.is_none() {
            months = dates.iter().map(|d| d.map(|d| d.month() as i64)).collect();
        }

        let null_dates = dates.iter().filter(|d| d.is_none()).count();
        if null_dates > 0 {
            warn!("{null_dates} rows have no parsable contract date (kept with null year/month)");
        }
        info!(
            "loaded {} property records from {}",
            locality.len(),
            path.display()
        );

        Dataset::from_columns(vec![
            (schema::LOCALITY.to_string(), Column::Str(locality)),
            (schema::PRIMARY_PURPOSE.to_string(), Column::Str(purpose)),
            (schema::CONTRACT_DATE.to_string(), Column::Date(dates)),
            (schema::CONTRACT_YEAR.to_string(), Column::Int64(years)),
            (schema::CONTRACT_MONTH.to_string(), Column::Int64(months)),
            (schema::PURCHASE_PRICE.to_string(), Column::Float64(price)),
            (schema::AREA.to_string(), Column::Float64(area)),
            (schema::POST_CODE.to_string(), Column::Float64(postcode)),
        ])
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Result<&Column, EngineError> {
        let pos = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| EngineError::MissingColumn(name.to_string()))?;
        Ok(&self.columns[pos])
    }

    pub fn str_column(&self, name: &str) -> Result<&[Option<String>], EngineError> {
        match self.column(name)? {
            Column::Str(v) => Ok(v),
            other => Err(type_error(name, "string", other)),
        }
    }

    pub fn f64_column(&self, name: &str) -> Result<&[Option<f64>], EngineError> {
        match self.column(name)? {
            Column::Float64(v) => Ok(v),
            other => Err(type_error(name, "float", other)),
        }
    }

    pub fn i64_column(&self, name: &str) -> Result<&[Option<i64>], EngineError> {
        match self.column(name)? {
            Column::Int64(v) => Ok(v),
            other => Err(type_error(name, "integer", other)),
        }
    }

    pub fn date_column(&self, name: &str) -> Result<&[Option<NaiveDate>], EngineError> {
        match self.column(name)? {
            Column::Date(v) => Ok(v),
            other => Err(type_error(name, "date", other)),
        }
    }
}

fn type_error(name: &str, expected: &'static str, got: &Column) -> EngineError {
    debug!("column '{}' is {}, wanted {}", name, got.type_name(), expected);
    EngineError::ColumnType {
        column: name.to_string(),
        expected,
    }
}

// -- Arrow extraction helpers --
//
// The conversion job nulls fields it cannot parse, so every extractor maps
// arrow nulls (and NaN, which pandas uses interchangeably for missing
// numbers) to None.

fn str_values(arr: &ArrayRef, name: &str) -> Result<Vec<Option<String>>, EngineError> {
    match arr.data_type() {
        DataType::Utf8 => {
            let a = arr.as_any().downcast_ref::<StringArray>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i).to_string()))
                .collect())
        }
        DataType::LargeUtf8 => {
            let a = arr.as_any().downcast_ref::<LargeStringArray>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i).to_string()))
                .collect())
        }
        other => Err(EngineError::Schema(format!(
            "column '{name}': expected a string column, got {other:?}"
        ))),
    }
}

fn f64_values(arr: &ArrayRef, name: &str) -> Result<Vec<Option<f64>>, EngineError> {
    let finite = |v: f64| v.is_finite().then_some(v);
    match arr.data_type() {
        DataType::Float64 => {
            let a = arr.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i)).and_then(finite))
                .collect())
        }
        DataType::Float32 => {
            let a = arr.as_any().downcast_ref::<Float32Array>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i) as f64).and_then(finite))
                .collect())
        }
        DataType::Int64 => {
            let a = arr.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i) as f64))
                .collect())
        }
        DataType::Int32 => {
            let a = arr.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i) as f64))
                .collect())
        }
        other => Err(EngineError::Schema(format!(
            "column '{name}': expected a numeric column, got {other:?}"
        ))),
    }
}

fn i64_values(arr: &ArrayRef, name: &str) -> Result<Vec<Option<i64>>, EngineError> {
    match arr.data_type() {
        DataType::Int64 => {
            let a = arr.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i)))
                .collect())
        }
        DataType::Int32 => {
            let a = arr.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i) as i64))
                .collect())
        }
        // pandas widens an integer column with missing values to float
        DataType::Float64 => {
            let a = arr.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok((0..a.len())
                .map(|i| {
                    (!a.is_null(i))
                        .then(|| a.value(i))
                        .filter(|v| v.is_finite())
                        .map(|v| v as i64)
                })
                .collect())
        }
        other => Err(EngineError::Schema(format!(
            "column '{name}': expected an integer column, got {other:?}"
        ))),
    }
}

fn date_values(arr: &ArrayRef, name: &str) -> Result<Vec<Option<NaiveDate>>, EngineError> {
    match arr.data_type() {
        DataType::Date32 => {
            let a = arr.as_any().downcast_ref::<Date32Array>().unwrap();
            Ok((0..a.len())
                .map(|i| {
                    (!a.is_null(i))
                        .then(|| a.value(i))
                        .and_then(date_from_epoch_days)
                })
                .collect())
        }
        DataType::Date64 => {
            let a = arr.as_any().downcast_ref::<Date64Array>().unwrap();
            Ok((0..a.len())
                .map(|i| {
                    (!a.is_null(i))
                        .then(|| a.value(i))
                        .and_then(DateTime::from_timestamp_millis)
                        .map(|dt| dt.date_naive())
                })
                .collect())
        }
        DataType::Timestamp(unit, _) => {
            let mut out = Vec::with_capacity(arr.len());
            for i in 0..arr.len() {
                if arr.is_null(i) {
                    out.push(None);
                    continue;
                }
                let dt = match unit {
                    TimeUnit::Second => {
                        let a = arr.as_any().downcast_ref::<TimestampSecondArray>().unwrap();
                        DateTime::from_timestamp(a.value(i), 0)
                    }
                    TimeUnit::Millisecond => {
                        let a = arr
                            .as_any()
                            .downcast_ref::<TimestampMillisecondArray>()
                            .unwrap();
                        DateTime::from_timestamp_millis(a.value(i))
                    }
                    TimeUnit::Microsecond => {
                        let a = arr
                            .as_any()
                            .downcast_ref::<TimestampMicrosecondArray>()
                            .unwrap();
                        DateTime::from_timestamp_micros(a.value(i))
                    }
                    TimeUnit::Nanosecond => {
                        let a = arr
                            .as_any()
                            .downcast_ref::<TimestampNanosecondArray>()
                            .unwrap();
                        Some(DateTime::from_timestamp_nanos(a.value(i)))
                    }
                };
                out.push(dt.map(|dt| dt.date_naive()));
            }
            Ok(out)
        }
        // Snapshots converted without date typing carry dates as text.
        // Unparsable values become null, never errors.
        DataType::Utf8 => {
            let a = arr.as_any().downcast_ref::<StringArray>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i)).and_then(parse_date_str))
                .collect())
        }
        DataType::LargeUtf8 => {
            let a = arr.as_any().downcast_ref::<LargeStringArray>().unwrap();
            Ok((0..a.len())
                .map(|i| (!a.is_null(i)).then(|| a.value(i)).and_then(parse_date_str))
                .collect())
        }
        other => Err(EngineError::Schema(format!(
            "column '{name}': expected a date column, got {other:?}"
        ))),
    }
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::days(days as i64))
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // timestamp-style strings: take the date part
    s.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}
