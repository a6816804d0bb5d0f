//! Reference distributions used by the tests in this crate
//!
//! Thin adapters over `statrs` that fix the conventions the tests rely on:
//! survival functions return `1` for non-positive statistics and `0` for
//! infinite ones, and `NaN` statistics propagate as `NaN` p-values.

use statrs::distribution::{
    Binomial, ChiSquared, ContinuousCDF, Discrete, DiscreteCDF, FisherSnedecor, Normal,
};

use crate::core::error::{Error, Result};

fn construction_error<E: std::fmt::Display>(name: &'static str) -> impl FnOnce(E) -> Error {
    move |e| Error::Computation(format!("Invalid {} parameters: {}", name, e))
}

/// Upper-tail probability of a chi-square distribution with `dof` degrees of freedom
pub fn chi2_sf(statistic: f64, dof: f64) -> Result<f64> {
    let dist = ChiSquared::new(dof).map_err(construction_error("chi-square"))?;
    Ok(upper_tail(statistic, |x| dist.sf(x)))
}

/// Upper-tail probability of an F distribution with `(dof1, dof2)` degrees of freedom
pub fn f_sf(statistic: f64, dof1: f64, dof2: f64) -> Result<f64> {
    let dist = FisherSnedecor::new(dof1, dof2).map_err(construction_error("F"))?;
    Ok(upper_tail(statistic, |x| dist.sf(x)))
}

fn upper_tail<F: Fn(f64) -> f64>(statistic: f64, sf: F) -> f64 {
    if statistic.is_nan() {
        f64::NAN
    } else if statistic <= 0.0 {
        1.0
    } else if statistic.is_infinite() {
        0.0
    } else {
        sf(statistic).clamp(0.0, 1.0)
    }
}

/// `P(X <= k)` for `X ~ Binomial(n, p)`
pub fn binom_cdf(k: u64, n: u64, p: f64) -> Result<f64> {
    let dist = Binomial::new(p, n).map_err(construction_error("binomial"))?;
    Ok(dist.cdf(k))
}

/// `P(X = k)` for `X ~ Binomial(n, p)`
pub fn binom_pmf(k: u64, n: u64, p: f64) -> Result<f64> {
    let dist = Binomial::new(p, n).map_err(construction_error("binomial"))?;
    Ok(dist.pmf(k))
}

/// Quantile function of the standard normal distribution
pub fn normal_ppf(p: f64) -> Result<f64> {
    let dist = Normal::new(0.0, 1.0).map_err(construction_error("normal"))?;
    Ok(dist.inverse_cdf(p))
}

/// Upper-tail probability of `N(mean, std_dev²)`
pub fn normal_sf(x: f64, mean: f64, std_dev: f64) -> Result<f64> {
    let dist = Normal::new(mean, std_dev).map_err(construction_error("normal"))?;
    Ok(dist.sf(x))
}
