//! Statistics module for categorical data
//!
//! This module builds contingency tables from pairs of categorical columns
//! and hosts the association tests that consume them.

pub mod dichotomous;
pub mod mcnemar;
pub mod power_divergence;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::data_value::Value;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;

/// ContingencyTable represents a cross-tabulation of categorical data
///
/// The same type carries observed counts, expected frequencies and
/// continuity-corrected counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Cell frequencies, `cells[row][col]`
    pub cells: Vec<Vec<f64>>,
    /// Row labels
    pub row_labels: Vec<Value>,
    /// Column labels
    pub col_labels: Vec<Value>,
    /// Row totals
    pub row_totals: Vec<f64>,
    /// Column totals
    pub col_totals: Vec<f64>,
    /// Grand total
    pub total: f64,
}

impl ContingencyTable {
    /// Create a new contingency table from cell frequencies
    pub fn new(
        cells: Vec<Vec<f64>>,
        row_labels: Option<Vec<Value>>,
        col_labels: Option<Vec<Value>>,
    ) -> Result<Self> {
        if cells.is_empty() || cells[0].is_empty() {
            return Err(Error::EmptyData("No data; observed has size 0".into()));
        }

        let rows = cells.len();
        let cols = cells[0].len();

        for row in &cells {
            if row.len() != cols {
                return Err(Error::DimensionMismatch(
                    "All rows must have the same number of columns".into(),
                ));
            }
            if row.iter().any(|&v| v < 0.0 || v.is_nan()) {
                return Err(Error::InvalidValue(
                    "All frequencies must be non-negative".into(),
                ));
            }
        }

        let row_labels = match row_labels {
            Some(labels) if labels.len() != rows => {
                return Err(Error::DimensionMismatch(format!(
                    "Number of row labels ({}) does not match number of rows ({})",
                    labels.len(),
                    rows
                )))
            }
            Some(labels) => labels,
            None => (0..rows).map(Value::from).collect(),
        };

        let col_labels = match col_labels {
            Some(labels) if labels.len() != cols => {
                return Err(Error::DimensionMismatch(format!(
                    "Number of column labels ({}) does not match number of columns ({})",
                    labels.len(),
                    cols
                )))
            }
            Some(labels) => labels,
            None => (0..cols).map(Value::from).collect(),
        };

        let row_totals: Vec<f64> = cells.iter().map(|row| row.iter().sum()).collect();
        let col_totals: Vec<f64> = (0..cols)
            .map(|j| cells.iter().map(|row| row[j]).sum())
            .collect();
        let total = row_totals.iter().sum();

        Ok(ContingencyTable {
            cells,
            row_labels,
            col_labels,
            row_totals,
            col_totals,
            total,
        })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.cells.len(), self.cells[0].len())
    }

    /// Degrees of freedom of the independence model, `(rows-1)*(cols-1)`
    pub fn dof(&self) -> usize {
        let (rows, cols) = self.shape();
        (rows - 1) * (cols - 1)
    }

    /// Frequency at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Cells in row-major order
    pub fn flatten(&self) -> Vec<f64> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Expected frequencies under independence, `row_total * col_total / total`
    pub fn expected_frequencies(&self) -> Result<ContingencyTable> {
        if self.total <= 0.0 {
            return Err(Error::InsufficientData(
                "Expected frequencies need a positive total count".into(),
            ));
        }

        let cells = self
            .row_totals
            .iter()
            .map(|&r| {
                self.col_totals
                    .iter()
                    .map(|&c| r * c / self.total)
                    .collect()
            })
            .collect();

        ContingencyTable::new(
            cells,
            Some(self.row_labels.clone()),
            Some(self.col_labels.clone()),
        )
    }

    /// New table with Yates' continuity correction applied.
    ///
    /// Every cell moves half a unit towards its expected frequency,
    /// `O + 0.5 * sign(E - O)`, without overshooting it: a cell closer than
    /// half a unit lands on its expectation.
    pub fn yates_corrected(&self, expected: &ContingencyTable) -> Result<ContingencyTable> {
        check_same_shape(self, expected)?;

        let cells = self
            .cells
            .iter()
            .zip(&expected.cells)
            .map(|(obs_row, exp_row)| {
                obs_row
                    .iter()
                    .zip(exp_row)
                    .map(|(&o, &e)| o + sign(e - o) * (e - o).abs().min(0.5))
                    .collect()
            })
            .collect();

        ContingencyTable::new(
            cells,
            Some(self.row_labels.clone()),
            Some(self.col_labels.clone()),
        )
    }

    /// Whether any cell is below `threshold`
    pub fn has_low_counts(&self, threshold: f64) -> bool {
        self.cells.iter().flatten().any(|&v| v < threshold)
    }

    /// Calculate Cramer's V - a measure of association between categorical variables
    pub fn cramers_v(&self) -> Result<f64> {
        let (rows, cols) = self.shape();
        let min_dim = (rows - 1).min(cols - 1);
        if min_dim == 0 {
            return Err(Error::InsufficientData(
                "Cannot calculate Cramer's V with only one row or column".into(),
            ));
        }

        let expected = self.expected_frequencies()?;
        let chi2 = power_divergence::PowerDivergence::Pearson
            .statistic(&self.flatten(), &expected.flatten());

        Ok((chi2 / (self.total * min_dim as f64)).sqrt())
    }
}

/// `numpy.sign` semantics: zero maps to zero
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub(crate) fn check_same_shape(a: &ContingencyTable, b: &ContingencyTable) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::DimensionMismatch(format!(
            "Observed table is {:?} but expected table is {:?}",
            a.shape(),
            b.shape()
        )));
    }
    Ok(())
}

fn check_columns(df: &DataFrame, x: &str, y: &str) -> Result<()> {
    for column in [x, y] {
        if !df.contains_column(column) {
            return Err(Error::ColumnNotFound(column.to_string()));
        }
    }
    Ok(())
}

/// Cross-tabulate two columns of a DataFrame.
///
/// Labels are sorted; rows with a missing value in either column are
/// skipped. Fails when no complete row remains.
pub fn crosstab(df: &DataFrame, x: &str, y: &str) -> Result<ContingencyTable> {
    check_columns(df, x, y)?;

    let xs = df.column(x)?;
    let ys = df.column(y)?;

    let mut counts: BTreeMap<(&Value, &Value), f64> = BTreeMap::new();
    let mut row_set: BTreeSet<&Value> = BTreeSet::new();
    let mut col_set: BTreeSet<&Value> = BTreeSet::new();

    for (xv, yv) in xs.iter().zip(ys) {
        if xv.is_null() || yv.is_null() {
            continue;
        }
        row_set.insert(xv);
        col_set.insert(yv);
        *counts.entry((xv, yv)).or_insert(0.0) += 1.0;
    }

    if row_set.is_empty() || col_set.is_empty() {
        return Err(Error::EmptyData("No data; observed has size 0".into()));
    }

    let cells = row_set
        .iter()
        .map(|&r| {
            col_set
                .iter()
                .map(|&c| counts.get(&(r, c)).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    ContingencyTable::new(
        cells,
        Some(row_set.into_iter().cloned().collect()),
        Some(col_set.into_iter().cloned().collect()),
    )
}

/// Cross-tabulate two dichotomous columns into a 2×2 table indexed `[0, 1] × [0, 1]`.
///
/// Every value is mapped through [`dichotomous::dichotomize`]; an unknown
/// token aborts with [`Error::UnrecognizedToken`]. Both levels are always
/// present, even when a level has no observations.
pub fn dichotomous_crosstab(df: &DataFrame, x: &str, y: &str) -> Result<ContingencyTable> {
    check_columns(df, x, y)?;

    let xs = dichotomous::dichotomize_column(df, x)?;
    let ys = dichotomous::dichotomize_column(df, y)?;

    let mut cells = vec![vec![0.0; 2]; 2];
    for (&a, &b) in xs.iter().zip(&ys) {
        cells[a as usize][b as usize] += 1.0;
    }

    let levels = vec![Value::Int(0), Value::Int(1)];
    ContingencyTable::new(cells, Some(levels.clone()), Some(levels))
}

/// Log a warning for each table that has a cell below `threshold`.
///
/// Advisory only; returns the names of the offending tables.
pub fn warn_low_counts<'a>(
    tables: &[(&'a str, &ContingencyTable)],
    threshold: f64,
) -> Vec<&'a str> {
    let mut flagged = Vec::new();
    for &(name, table) in tables {
        if table.has_low_counts(threshold) {
            log::warn!("Low count on {} frequencies (threshold {}).", name, threshold);
            flagged.push(name);
        }
    }
    flagged
}
