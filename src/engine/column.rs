use chrono::NaiveDate;

/// One typed, nullable column of the dataset.
///
/// Null is a stored value, not an error: a row whose price failed to parse
/// during conversion is kept with `None` in that slot and participates in
/// filtering and counting like any other row.
#[derive(Debug, Clone)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Int64(_) => "integer",
            Column::Float64(_) => "float",
            Column::Str(_) => "string",
            Column::Date(_) => "date",
        }
    }

    // Random access, O(1). Out-of-range or wrong type yields None; the
    // typed dataset accessors are the error-reporting path.
    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        match self {
            Column::Int64(v) => v.get(idx).copied().flatten(),
            _ => None,
        }
    }

    pub fn get_f64(&self, idx: usize) -> Option<f64> {
        match self {
            Column::Float64(v) => v.get(idx).copied().flatten(),
            _ => None,
        }
    }

    pub fn get_str(&self, idx: usize) -> Option<&str> {
        match self {
            Column::Str(v) => v.get(idx).and_then(|s| s.as_deref()),
            _ => None,
        }
    }

    pub fn get_date(&self, idx: usize) -> Option<NaiveDate> {
        match self {
            Column::Date(v) => v.get(idx).copied().flatten(),
            _ => None,
        }
    }
}
