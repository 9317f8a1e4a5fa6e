//! Result rows and typed column access.

use djangoseo_core::SeoError;

use crate::value::Value;

/// A database row returned by a backend.
///
/// `Row` holds the column names and their values and provides typed access
/// via [`get`](Row::get).
///
/// # Examples
///
/// ```
/// use djangoseo_db::{Row, Value};
///
/// let row = Row::new(
///     vec!["id".into(), "old_path".into()],
///     vec![Value::Int(1), Value::String("/old/".into())],
/// );
/// assert_eq!(row.get::<i64>("id").unwrap(), 1);
/// assert_eq!(row.get::<String>("old_path").unwrap(), "/old/");
/// ```
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, SeoError> {
        let value = self.get_value(column).ok_or_else(|| {
            SeoError::DatabaseError(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Gets a typed value by column index.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> Result<T, SeoError> {
        let value = self.values.get(idx).ok_or_else(|| {
            SeoError::DatabaseError(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> Result<Self, SeoError>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, SeoError> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(SeoError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, SeoError> {
        match value {
            Value::Int(i) => Self::try_from(*i).map_err(|e| {
                SeoError::DatabaseError(format!("Int value out of u64 range: {e}"))
            }),
            _ => Err(SeoError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

// SQLite has no boolean storage class; booleans come back as 0/1 integers.
impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, SeoError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            _ => Err(SeoError::DatabaseError(format!(
                "Expected Bool, got {value:?}"
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, SeoError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(SeoError::DatabaseError(format!(
                "Expected String, got {value:?}"
            ))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, SeoError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
