//! Assumption checks for parametric tests
//!
//! Shapiro-Wilk normality (Royston's approximation), Bartlett's and Levene's
//! tests for equal variances, and the geometric z-score.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::stats::distributions::{chi2_sf, f_sf, normal_ppf, normal_sf};

/// Result of a normality test on one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normality {
    /// `p_value > alpha`
    pub normal: bool,
    /// Shapiro-Wilk W
    pub w: f64,
    pub p_value: f64,
}

/// Test used by [`homoscedasticity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomoscedasticityMethod {
    Bartlett,
    Levene,
}

/// Result of an equal-variance test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homoscedasticity {
    /// `p_value > alpha`
    pub equal_var: bool,
    pub method: HomoscedasticityMethod,
    pub statistic: f64,
    pub p_value: f64,
}

/// Geometric standard score of strictly positive values.
///
/// `ln(x / gmean) / ln(gstd)`, where `gstd` is the geometric standard
/// deviation with `n - 1` in the denominator.
pub fn gzscore(x: &[f64]) -> Result<Vec<f64>> {
    if x.len() < 2 {
        return Err(Error::InsufficientData(
            "Geometric z-score needs at least 2 values".into(),
        ));
    }
    if x.iter().any(|&v| !(v > 0.0) || !v.is_finite()) {
        return Err(Error::InvalidValue(
            "Geometric z-score is defined for positive finite values only".into(),
        ));
    }

    let logs: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let log_mean = logs.iter().sum::<f64>() / logs.len() as f64;
    let deviations: Vec<f64> = logs.iter().map(|l| l - log_mean).collect();
    let log_gstd =
        (deviations.iter().map(|d| d * d).sum::<f64>() / (x.len() - 1) as f64).sqrt();

    if log_gstd == 0.0 {
        return Err(Error::InvalidValue(
            "Geometric z-score of constant values is undefined".into(),
        ));
    }

    Ok(deviations.into_iter().map(|d| d / log_gstd).collect())
}

/// Shapiro-Wilk normality test on each sample
pub fn normality(samples: &[&[f64]], alpha: f64) -> Result<Vec<Normality>> {
    samples
        .iter()
        .map(|sample| {
            let (w, p_value) = shapiro_wilk(sample)?;
            Ok(Normality {
                normal: p_value > alpha,
                w,
                p_value,
            })
        })
        .collect()
}

/// Equality of variances across samples.
///
/// Bartlett's test when every sample passes the normality check at `alpha`,
/// Levene's test (median-centred) otherwise.
pub fn homoscedasticity(samples: &[&[f64]], alpha: f64) -> Result<Homoscedasticity> {
    if samples.len() < 2 {
        return Err(Error::InsufficientData(
            "Must enter at least two input samples".into(),
        ));
    }

    let all_normal = normality(samples, alpha)?.iter().all(|n| n.normal);
    let (method, (statistic, p_value)) = if all_normal {
        (HomoscedasticityMethod::Bartlett, bartlett(samples)?)
    } else {
        log::debug!("Samples are not all normal, using Levene's test");
        (HomoscedasticityMethod::Levene, levene(samples)?)
    };

    Ok(Homoscedasticity {
        equal_var: p_value > alpha,
        method,
        statistic,
        p_value,
    })
}

const SMALL: f64 = 1e-19;

// Royston (1995) polynomial coefficients, lowest order first
const G: [f64; 2] = [-2.273, 0.459];
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Shapiro-Wilk W and its p-value, for `3 <= n <= 5000`
pub fn shapiro_wilk(sample: &[f64]) -> Result<(f64, f64)> {
    let n = sample.len();
    if n < 3 {
        return Err(Error::InsufficientData(format!(
            "Shapiro-Wilk needs at least 3 observations, got {}",
            n
        )));
    }
    if n > 5000 {
        return Err(Error::InvalidValue(format!(
            "Shapiro-Wilk supports at most 5000 observations, got {}",
            n
        )));
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidValue(
            "Shapiro-Wilk input contains non-finite values".into(),
        ));
    }

    let mut x = sample.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] < SMALL {
        return Err(Error::InvalidValue(
            "Shapiro-Wilk is undefined for identical values".into(),
        ));
    }

    let a = shapiro_coefficients(n)?;

    let mean = x.iter().sum::<f64>() / n as f64;
    let ssq: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ssq).min(1.0);

    Ok((w, shapiro_p_value(w, n)?))
}

/// Upper half of the Shapiro-Wilk coefficients, `a[0]` pairing the extremes
fn shapiro_coefficients(n: usize) -> Result<Vec<f64>> {
    let half = n / 2;
    if n == 3 {
        return Ok(vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    let an25 = n as f64 + 0.25;
    let m = (1..=half)
        .map(|i| normal_ppf((i as f64 - 0.375) / an25))
        .collect::<Result<Vec<f64>>>()?;

    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = vec![0.0; half];
    a[0] = a1;
    let first_scaled = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        2
    } else {
        1
    };

    let (m_used, a_used) = m[..first_scaled]
        .iter()
        .zip(&a[..first_scaled])
        .fold((0.0, 0.0), |(m_sum, a_sum), (mi, ai)| {
            (m_sum + mi * mi, a_sum + ai * ai)
        });
    let fac = ((summ2 - 2.0 * m_used) / (1.0 - 2.0 * a_used)).sqrt();

    for i in first_scaled..half {
        a[i] = -m[i] / fac;
    }

    Ok(a)
}

fn shapiro_p_value(w: f64, n: usize) -> Result<f64> {
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI
            * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        return Ok(p.clamp(0.0, 1.0));
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return Ok(1e-99);
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    normal_sf(y, m, s)
}

fn check_samples(samples: &[&[f64]], min_len: usize) -> Result<()> {
    if samples.len() < 2 {
        return Err(Error::InsufficientData(
            "Must enter at least two input samples".into(),
        ));
    }
    if let Some(sample) = samples.iter().find(|s| s.len() < min_len) {
        return Err(Error::InsufficientData(format!(
            "Every sample needs at least {} values, got {}",
            min_len,
            sample.len()
        )));
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Bartlett's test statistic and p-value
pub fn bartlett(samples: &[&[f64]]) -> Result<(f64, f64)> {
    check_samples(samples, 2)?;

    let k = samples.len() as f64;
    let ni: Vec<f64> = samples.iter().map(|s| s.len() as f64).collect();
    let total: f64 = ni.iter().sum();
    let variances: Vec<f64> = samples
        .iter()
        .zip(&ni)
        .map(|(s, n)| {
            let m = mean(s);
            s.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0)
        })
        .collect();

    if variances.iter().any(|&v| v <= 0.0) {
        return Err(Error::InvalidValue(
            "Bartlett's test needs every sample to have positive variance".into(),
        ));
    }

    let pooled = ni
        .iter()
        .zip(&variances)
        .map(|(n, v)| (n - 1.0) * v)
        .sum::<f64>()
        / (total - k);
    let numerator = (total - k) * pooled.ln()
        - ni
            .iter()
            .zip(&variances)
            .map(|(n, v)| (n - 1.0) * v.ln())
            .sum::<f64>();
    let denominator = 1.0
        + (ni.iter().map(|n| 1.0 / (n - 1.0)).sum::<f64>() - 1.0 / (total - k))
            / (3.0 * (k - 1.0));

    let statistic = numerator / denominator;
    Ok((statistic, chi2_sf(statistic, k - 1.0)?))
}

/// Levene's test (deviations from the median) statistic and p-value
pub fn levene(samples: &[&[f64]]) -> Result<(f64, f64)> {
    check_samples(samples, 1)?;

    let k = samples.len() as f64;
    let deviations: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            let center = median(s);
            s.iter().map(|v| (v - center).abs()).collect()
        })
        .collect();

    let total: f64 = deviations.iter().map(|z| z.len() as f64).sum();
    if total <= k {
        return Err(Error::InsufficientData(
            "Levene's test needs more observations than samples".into(),
        ));
    }

    let group_means: Vec<f64> = deviations.iter().map(|z| mean(z)).collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / total;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();

    let statistic = (total - k) / (k - 1.0) * between / within;
    Ok((statistic, f_sf(statistic, k - 1.0, total - k)?))
}
