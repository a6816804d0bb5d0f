//! Mauchly's test of sphericity

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::stats::distributions::chi2_sf;
use crate::stats::linalg::{covariance, determinant, matrix_rank, trace};

/// Result of Mauchly's test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphericity {
    /// Whether sphericity holds at the requested level (`p > alpha`)
    pub sphericity: bool,
    /// Mauchly's W
    pub w: f64,
    /// Chi-square approximation of the statistic
    pub chi2: f64,
    /// Degrees of freedom, `d(d+1)/2` with `d = k - 1`
    pub dof: usize,
    pub p_value: f64,
}

/// Mauchly's test on an `n × k` matrix (subjects × conditions).
///
/// The covariance matrix is taken with divisor `n - k` and scaled by `k`.
/// When it is singular, including every design with `n <= k`, W takes its
/// limit of 0: the chi-square statistic is infinite and sphericity is
/// rejected.
pub fn sphericity(data: &Array2<f64>, alpha: f64) -> Result<Sphericity> {
    let (n, k) = data.dim();
    if k < 2 {
        return Err(Error::InsufficientData(format!(
            "Sphericity needs at least 2 conditions, got {}",
            k
        )));
    }
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "Sphericity needs at least 2 subjects, got {}",
            n
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidValue(
            "Sphericity input contains non-finite values".into(),
        ));
    }

    let d = (k - 1) as f64;
    let dof = (k - 1) * k / 2;

    if n <= k {
        log::debug!(
            "{} subjects for {} conditions, covariance is singular",
            n,
            k
        );
        return Ok(Sphericity::singular(dof));
    }

    let cov = covariance(data, k)? * k as f64;
    let det = determinant(&cov)?;
    if det <= 0.0 || matrix_rank(&cov) < k {
        log::debug!("Covariance matrix is singular (determinant {})", det);
        return Ok(Sphericity::singular(dof));
    }

    let w = det / (trace(&cov) / d).powf(d);
    let rank = matrix_rank(data) as f64;
    let chi2 = w.ln() * ((2.0 * d * d + d + 2.0) / 6.0 * d - n as f64 - rank);
    let p_value = chi2_sf(chi2, dof as f64)?;

    Ok(Sphericity {
        sphericity: p_value > alpha,
        w,
        chi2,
        dof,
        p_value,
    })
}

impl Sphericity {
    fn singular(dof: usize) -> Self {
        Sphericity {
            sphericity: false,
            w: 0.0,
            chi2: f64::INFINITY,
            dof,
            p_value: 0.0,
        }
    }
}
