//! Matrix primitives for the repeated-measures routines
//!
//! Data matrices are `ndarray` arrays with one row per observation and one
//! column per variable; decompositions go through `nalgebra`.

use nalgebra::DMatrix;
use ndarray::{Array2, Axis};

use crate::core::error::{Error, Result};

/// Covariance matrix of the columns of `data`, dividing by `n - ddof`
pub fn covariance(data: &Array2<f64>, ddof: usize) -> Result<Array2<f64>> {
    let (n, k) = data.dim();
    if n <= ddof {
        return Err(Error::InsufficientData(format!(
            "Covariance with ddof={} needs more than {} observations, got {}",
            ddof, ddof, n
        )));
    }

    let means = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::EmptyData("Covariance of an empty matrix".into()))?;
    let centered = data - &means;
    let divisor = (n - ddof) as f64;

    let mut cov = Array2::<f64>::zeros((k, k));
    for a in 0..k {
        for b in a..k {
            let s = centered.column(a).dot(&centered.column(b)) / divisor;
            cov[[a, b]] = s;
            cov[[b, a]] = s;
        }
    }

    Ok(cov)
}

fn to_nalgebra(matrix: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = matrix.dim();
    DMatrix::from_fn(rows, cols, |i, j| matrix[[i, j]])
}

/// Determinant of a square matrix
pub fn determinant(matrix: &Array2<f64>) -> Result<f64> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(Error::DimensionMismatch(format!(
            "Determinant requires a square matrix, got {}x{}",
            rows, cols
        )));
    }
    Ok(to_nalgebra(matrix).determinant())
}

/// Sum of the diagonal of a square matrix
pub fn trace(matrix: &Array2<f64>) -> f64 {
    matrix.diag().sum()
}

/// Numerical rank via SVD.
///
/// Singular values below `max(σ) · max(rows, cols) · ε` count as zero.
pub fn matrix_rank(matrix: &Array2<f64>) -> usize {
    let (rows, cols) = matrix.dim();
    if rows == 0 || cols == 0 {
        return 0;
    }

    let svd = to_nalgebra(matrix).svd(false, false);
    let largest = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let tolerance = largest * rows.max(cols) as f64 * f64::EPSILON;

    svd.singular_values
        .iter()
        .filter(|&&s| s > tolerance)
        .count()
}
