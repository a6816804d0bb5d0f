//! Module providing grouping and long-to-wide pivot functionality

use std::collections::{HashMap, HashSet};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::data_value::Value;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;

/// Numeric values of one group, in row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group key
    pub key: Value,
    /// Non-missing values belonging to the group
    pub values: Vec<f64>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Wide matrix produced by [`pivot_wide`]
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Row labels (one per complete index value)
    pub index: Vec<Value>,
    /// Column labels (one per distinct column value)
    pub columns: Vec<Value>,
    /// `index.len() × columns.len()` values
    pub data: Array2<f64>,
    /// Index values dropped because at least one cell was missing
    pub dropped: Vec<Value>,
}

/// Group the numeric `values` column by the `by` column.
///
/// Groups appear in order of first appearance; missing keys and missing
/// values are skipped.
pub fn group_values(df: &DataFrame, by: &str, values: &str) -> Result<Vec<Group>> {
    let keys = df.column(by)?;
    let numbers = df.get_column_optional_numeric_values(values)?;

    let mut positions: HashMap<&Value, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for (key, value) in keys.iter().zip(numbers) {
        if key.is_null() {
            continue;
        }
        let idx = *positions.entry(key).or_insert_with(|| {
            groups.push(Group {
                key: key.clone(),
                values: Vec::new(),
            });
            groups.len() - 1
        });
        if let Some(value) = value {
            groups[idx].values.push(value);
        }
    }

    Ok(groups)
}

/// Pivot a long table to a wide `index × columns` matrix of `values`.
///
/// Rows and columns are in order of first appearance. An index value with
/// any missing cell is dropped from the result (and listed in
/// [`WideTable::dropped`]); a duplicated `(index, column)` pair is an error.
pub fn pivot_wide(df: &DataFrame, index: &str, columns: &str, values: &str) -> Result<WideTable> {
    let index_col = df.column(index)?;
    let columns_col = df.column(columns)?;
    let numbers = df.get_column_optional_numeric_values(values)?;

    let mut index_labels: Vec<Value> = Vec::new();
    let mut index_pos: HashMap<&Value, usize> = HashMap::new();
    let mut column_labels: Vec<Value> = Vec::new();
    let mut column_pos: HashMap<&Value, usize> = HashMap::new();
    let mut cells: HashMap<(usize, usize), f64> = HashMap::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for ((row_key, col_key), value) in index_col.iter().zip(columns_col).zip(numbers) {
        if row_key.is_null() || col_key.is_null() {
            continue;
        }
        let i = *index_pos.entry(row_key).or_insert_with(|| {
            index_labels.push(row_key.clone());
            index_labels.len() - 1
        });
        let j = *column_pos.entry(col_key).or_insert_with(|| {
            column_labels.push(col_key.clone());
            column_labels.len() - 1
        });

        if !seen.insert((i, j)) {
            return Err(Error::InvalidValue(format!(
                "Duplicate entry for index '{}' and column '{}'",
                row_key, col_key
            )));
        }
        if let Some(value) = value {
            cells.insert((i, j), value);
        }
    }

    let ncols = column_labels.len();
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    let mut data = Vec::new();

    for (i, label) in index_labels.into_iter().enumerate() {
        let row: Option<Vec<f64>> = (0..ncols).map(|j| cells.get(&(i, j)).copied()).collect();
        match row {
            Some(row) => {
                data.extend(row);
                kept.push(label);
            }
            None => dropped.push(label),
        }
    }

    let data = Array2::from_shape_vec((kept.len(), ncols), data)
        .map_err(|e| Error::DimensionMismatch(e.to_string()))?;

    Ok(WideTable {
        index: kept,
        columns: column_labels,
        data,
        dropped,
    })
}

/// DataFrame extension: grouping and pivot functionality
impl DataFrame {
    /// Group numeric values by a key column
    pub fn group_values(&self, by: &str, values: &str) -> Result<Vec<Group>> {
        group_values(self, by, values)
    }

    /// Pivot a long table to a wide matrix
    pub fn pivot_wide(&self, index: &str, columns: &str, values: &str) -> Result<WideTable> {
        pivot_wide(self, index, columns, values)
    }
}
