use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::data_value::Value;
use crate::core::error::{Error, Result};

/// Column-oriented, immutable-by-convention table of [`Value`] cells.
///
/// Every statistical routine in this crate takes `&DataFrame`; any derived
/// column (such as a synthetic subject index) is attached to a private copy
/// through [`DataFrame::with_column`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: HashMap<String, Vec<Value>>,
    column_order: Vec<String>,
    row_count: usize,
}

impl DataFrame {
    /// Create a new empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a DataFrame from `(name, values)` pairs, preserving their order
    pub fn from_columns<S, V>(columns: Vec<(S, Vec<V>)>) -> Result<Self>
    where
        S: Into<String>,
        V: Into<Value>,
    {
        let mut df = Self::new();
        for (name, values) in columns {
            df.add_column(name, values)?;
        }
        Ok(df)
    }

    /// Check if the DataFrame contains a column with the given name
    pub fn contains_column(&self, column_name: &str) -> bool {
        self.columns.contains_key(column_name)
    }

    /// Get the number of rows in the DataFrame
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Get the number of columns in the DataFrame
    pub fn column_count(&self) -> usize {
        self.column_order.len()
    }

    /// Add a column to the DataFrame
    pub fn add_column<S, V>(&mut self, column_name: S, values: Vec<V>) -> Result<()>
    where
        S: Into<String>,
        V: Into<Value>,
    {
        let column_name = column_name.into();
        if self.contains_column(&column_name) {
            return Err(Error::DuplicateColumnName(column_name));
        }

        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if !self.columns.is_empty() && values.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: values.len(),
            });
        }

        if self.columns.is_empty() {
            self.row_count = values.len();
        }
        self.columns.insert(column_name.clone(), values);
        self.column_order.push(column_name);

        Ok(())
    }

    /// Return a copy of this DataFrame with one extra column.
    ///
    /// `self` is left untouched.
    pub fn with_column<S, V>(&self, column_name: S, values: Vec<V>) -> Result<Self>
    where
        S: Into<String>,
        V: Into<Value>,
    {
        let mut copy = self.clone();
        copy.add_column(column_name, values)?;
        Ok(copy)
    }

    /// Get column names in insertion order
    pub fn column_names(&self) -> Vec<String> {
        self.column_order.clone()
    }

    /// Get the raw cells of a column
    pub fn column(&self, column_name: &str) -> Result<&[Value]> {
        self.columns
            .get(column_name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::ColumnNotFound(column_name.to_string()))
    }

    /// Get numeric values from a column, keeping missing cells as `None`.
    ///
    /// Integers and floats convert directly; strings are parsed.
    pub fn get_column_optional_numeric_values(&self, column_name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(column_name)?;

        column
            .iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Null => Ok(None),
                Value::Int(v) => Ok(Some(*v as f64)),
                Value::Float(v) => Ok(Some(*v)),
                Value::Str(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                    Error::InvalidValue(format!(
                        "Value '{}' at index {} in column '{}' cannot be converted to numeric",
                        s, i, column_name
                    ))
                }),
                Value::Bool(_) => Err(Error::InvalidValue(format!(
                    "Boolean at index {} in column '{}' is not numeric",
                    i, column_name
                ))),
            })
            .collect()
    }
}
