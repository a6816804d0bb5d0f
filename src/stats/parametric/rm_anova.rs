//! One-way repeated-measures ANOVA with Greenhouse-Geisser correction

use std::collections::HashMap;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::sphericity::sphericity;
use crate::core::data_value::Value;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::pivot::WideTable;
use crate::stats::distributions::f_sf;
use crate::stats::linalg::{covariance, trace};

/// Name of the synthetic subject column attached to private copies
const SUBJECT_COLUMN: &str = "__subject__";

/// Greenhouse-Geisser correction, present when sphericity was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseGeisser {
    /// Correction factor, clipped to at most 1
    #[serde(rename = "eps")]
    pub epsilon: f64,
    /// Corrected numerator degrees of freedom, `max(dof1 * epsilon, 1)`
    #[serde(rename = "dof1-GG")]
    pub dof1: f64,
    /// Corrected denominator degrees of freedom, `max(dof2 * epsilon, 1)`
    #[serde(rename = "dof2-GG")]
    pub dof2: f64,
    /// p-value of the same F statistic under the corrected degrees of freedom
    #[serde(rename = "p-GG-corr")]
    pub p_corr: f64,
    /// Mauchly's W
    #[serde(rename = "W-Mauchly")]
    pub w_mauchly: f64,
    /// p-value of Mauchly's test
    #[serde(rename = "p-Mauchly")]
    pub p_mauchly: f64,
}

/// Summary of a one-way repeated-measures ANOVA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmAnova {
    /// Name of the within-subject factor
    #[serde(rename = "Effect")]
    pub effect: String,
    pub dof1: usize,
    pub dof2: usize,
    #[serde(rename = "F")]
    pub f: f64,
    pub p_unc: f64,
    /// Outcome of Mauchly's test
    pub sphericity: bool,
    /// Filled in only when sphericity was rejected; its fields serialize
    /// alongside the uncorrected ones
    #[serde(flatten)]
    pub correction: Option<GreenhouseGeisser>,
    /// Number of complete subjects entering the analysis
    pub n_subjects: usize,
}

impl RmAnova {
    /// Greenhouse-Geisser p-value when the correction was applied, else the uncorrected one
    pub fn p_value(&self) -> f64 {
        self.correction
            .as_ref()
            .map(|gg| gg.p_corr)
            .unwrap_or(self.p_unc)
    }
}

/// Repeated-measures ANOVA on a long table without a subject column.
///
/// The `i`-th row of each condition is taken to belong to subject `i`, so
/// every condition must have the same number of rows. The subject index is
/// attached to a private copy of `df`.
pub fn rm_anova(
    df: &DataFrame,
    dv: &str,
    within: &str,
    sphericity_alpha: f64,
) -> Result<RmAnova> {
    let conditions = df.column(within)?;
    if !df.contains_column(dv) {
        return Err(Error::ColumnNotFound(dv.to_string()));
    }

    let mut counts: HashMap<&Value, i64> = HashMap::new();
    let mut order: Vec<&Value> = Vec::new();
    let subjects: Vec<Value> = conditions
        .iter()
        .map(|condition| {
            if condition.is_null() {
                return Value::Null;
            }
            let seen = counts.entry(condition).or_insert_with(|| {
                order.push(condition);
                0
            });
            let subject = *seen;
            *seen += 1;
            Value::Int(subject)
        })
        .collect();

    if let Some(&first) = order.first() {
        let expected = counts[first];
        if let Some(&level) = order.iter().find(|&&level| counts[level] != expected) {
            return Err(Error::UnbalancedDesign(format!(
                "level '{}' has {} observations but level '{}' has {}",
                level, counts[level], first, expected
            )));
        }
    }

    let copy = df.with_column(SUBJECT_COLUMN, subjects)?;
    let wide = copy.pivot_wide(SUBJECT_COLUMN, within, dv)?;
    from_wide(&wide, within, sphericity_alpha)
}

/// Repeated-measures ANOVA keyed by an explicit subject column.
///
/// Subjects missing any condition are dropped with a warning.
pub fn rm_anova_with_subject(
    df: &DataFrame,
    dv: &str,
    within: &str,
    subject: &str,
    sphericity_alpha: f64,
) -> Result<RmAnova> {
    let wide = df.pivot_wide(subject, within, dv)?;
    from_wide(&wide, within, sphericity_alpha)
}

fn from_wide(wide: &WideTable, effect: &str, sphericity_alpha: f64) -> Result<RmAnova> {
    if !wide.dropped.is_empty() {
        log::warn!(
            "Dropped {} subject(s) with missing measurements: {}",
            wide.dropped.len(),
            wide.dropped
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    rm_anova_matrix(&wide.data, effect, sphericity_alpha)
}

/// Repeated-measures ANOVA on an `n × k` matrix (subjects × conditions)
pub fn rm_anova_matrix(data: &Array2<f64>, effect: &str, sphericity_alpha: f64) -> Result<RmAnova> {
    let (n, k) = data.dim();
    if k < 2 {
        return Err(Error::InsufficientData(format!(
            "Repeated-measures ANOVA needs at least 2 conditions, got {}",
            k
        )));
    }
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "Repeated-measures ANOVA needs at least 2 complete subjects, got {}",
            n
        )));
    }

    let condition_means = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::EmptyData("No complete subjects".into()))?;
    let subject_means = data
        .mean_axis(Axis(1))
        .ok_or_else(|| Error::EmptyData("No conditions".into()))?;
    let grand_mean = condition_means.mean().unwrap_or(f64::NAN);
    let subject_grand_mean = subject_means.mean().unwrap_or(f64::NAN);

    let ss_time = n as f64 * condition_means.mapv(|m| (m - grand_mean).powi(2)).sum();
    let ss_within = (data - &condition_means).mapv(|d| d * d).sum();
    let ss_subjects = k as f64 * subject_means.mapv(|m| (m - subject_grand_mean).powi(2)).sum();
    let ss_error = ss_within - ss_subjects;

    let dof1 = k - 1;
    let dof2 = dof1 * (n - 1);
    let ms_error = ss_error / (dof2 as f64 / dof1 as f64);
    let f = ss_time / ms_error;
    let p_unc = f_sf(f, dof1 as f64, dof2 as f64)?;

    let mauchly = sphericity(data, sphericity_alpha)?;
    let correction = if mauchly.sphericity {
        None
    } else {
        log::debug!(
            "Sphericity rejected (p = {}), applying Greenhouse-Geisser correction",
            mauchly.p_value
        );
        let v = covariance(data, 1)?;
        let sum_sq = v.mapv(|x| x * x).sum();
        let epsilon = (trace(&v).powi(2) / dof1 as f64 * sum_sq).min(1.0);
        let corr_dof1 = (dof1 as f64 * epsilon).max(1.0);
        let corr_dof2 = (dof2 as f64 * epsilon).max(1.0);

        Some(GreenhouseGeisser {
            epsilon,
            dof1: corr_dof1,
            dof2: corr_dof2,
            p_corr: f_sf(f, corr_dof1, corr_dof2)?,
            w_mauchly: mauchly.w,
            p_mauchly: mauchly.p_value,
        })
    };

    Ok(RmAnova {
        effect: effect.to_string(),
        dof1,
        dof2,
        f,
        p_unc,
        sphericity: mauchly.sphericity,
        correction,
        n_subjects: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn long_frame(data: &Array2<f64>) -> DataFrame {
        let (n, k) = data.dim();
        let mut dv = Vec::new();
        let mut time = Vec::new();
        for j in 0..k {
            for i in 0..n {
                dv.push(Value::Float(data[[i, j]]));
                time.push(Value::from(format!("t{}", j)));
            }
        }
        DataFrame::from_columns(vec![("score", dv), ("time", time)]).unwrap()
    }

    fn sample() -> Array2<f64> {
        array![
            [10.0, 12.0, 15.0],
            [8.0, 11.0, 12.0],
            [9.0, 9.0, 14.0],
            [11.0, 14.0, 13.0],
            [7.0, 10.0, 12.0],
        ]
    }

    #[test]
    fn test_sum_of_squares() {
        let result = rm_anova_matrix(&sample(), "time", 0.01).unwrap();

        // Condition means 9, 11.2, 13.2; grand mean 11.1333
        // ss_time = 44.1333, ss_error = 11.2 -> F = 44.1333 / 2.8
        assert_eq!(result.dof1, 2);
        assert_eq!(result.dof2, 8);
        assert!((result.f - 44.133333333333333 / 2.8).abs() < 1e-9);
        // For dof (2, 8): P(F > x) = (1 + x/4)^-4
        assert!((result.p_unc - (1.0 + result.f / 4.0).powi(-4)).abs() < 1e-9);
        assert!(result.sphericity);
        assert!(result.correction.is_none());
        assert!(result.p_unc > 0.0 && result.p_unc < 0.01);
        assert_eq!(result.n_subjects, 5);
    }

    #[test]
    fn test_long_table_matches_matrix() {
        let data = sample();
        let df = long_frame(&data);
        let from_long = rm_anova(&df, "score", "time", 0.01).unwrap();
        let from_matrix = rm_anova_matrix(&data, "time", 0.01).unwrap();
        assert_eq!(from_long, from_matrix);
        // Caller's table is not annotated
        assert!(!df.contains_column(SUBJECT_COLUMN));
    }

    #[test]
    fn test_unbalanced_design() {
        let df = DataFrame::from_columns(vec![
            ("score", vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]),
            ("time", vec![Value::from("a"), Value::from("a"), Value::from("b")]),
        ])
        .unwrap();
        assert!(matches!(
            rm_anova(&df, "score", "time", 0.01),
            Err(Error::UnbalancedDesign(_))
        ));
    }

    #[test]
    fn test_explicit_subjects_drop_incomplete() {
        let data = sample();
        let (n, k) = data.dim();
        let mut subject = Vec::new();
        let mut time = Vec::new();
        let mut score = Vec::new();
        // Subjects listed in reverse within each condition
        for j in 0..k {
            for i in (0..n).rev() {
                subject.push(Value::from(format!("s{}", i)));
                time.push(Value::from(j as i64));
                score.push(Value::Float(data[[i, j]]));
            }
        }
        // An extra subject seen in only one condition
        subject.push(Value::from("s99"));
        time.push(Value::from(0i64));
        score.push(Value::Float(100.0));

        let df = DataFrame::from_columns(vec![
            ("subject", subject),
            ("time", time),
            ("score", score),
        ])
        .unwrap();

        let result = rm_anova_with_subject(&df, "score", "time", "subject", 0.01).unwrap();
        let reference = rm_anova_matrix(&data, "time", 0.01).unwrap();
        assert_eq!(result.n_subjects, 5);
        assert!((result.f - reference.f).abs() < 1e-9);
        assert!((result.p_unc - reference.p_unc).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_subjects() {
        let data = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            rm_anova_matrix(&data, "time", 0.01),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_as_many_subjects_as_conditions() {
        let data = array![[1.0, 2.0, 4.0], [2.0, 4.0, 5.0], [3.0, 3.0, 7.0]];
        let result = rm_anova_matrix(&data, "time", 0.01).unwrap();

        assert_eq!(result.dof1, 2);
        assert_eq!(result.dof2, 4);
        assert!((result.f - 14.363636363636363).abs() < 1e-9);
        // For dof (2, 4): P(F > x) = (1 + x/2)^-2
        assert!((result.p_unc - (1.0 + result.f / 2.0).powi(-2)).abs() < 1e-12);

        // Covariance of 3 subjects over 3 conditions is singular
        assert!(!result.sphericity);
        let gg = result.correction.unwrap();
        assert_eq!(gg.w_mauchly, 0.0);
        assert_eq!(gg.p_mauchly, 0.0);
        assert_eq!(gg.epsilon, 1.0);
        assert_eq!(gg.p_corr, result.p_unc);
    }

    #[test]
    fn test_constant_condition() {
        let data = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let result = rm_anova_matrix(&data, "time", 0.01).unwrap();

        // ss_time = 12.5, ss_error = 2.5 on (1, 3) dof
        assert_eq!(result.dof1, 1);
        assert_eq!(result.dof2, 3);
        assert!((result.f - 15.0).abs() < 1e-9);
        assert!(!result.sphericity);
        let gg = result.correction.unwrap();
        assert_eq!(gg.w_mauchly, 0.0);
        assert_eq!(gg.dof1, 1.0);
        assert_eq!(gg.dof2, 3.0);
    }

    #[test]
    fn test_serialized_keys() {
        let corrected = rm_anova_matrix(&sample(), "time", 1.0).unwrap();
        let json: serde_json::Value = serde_json::to_value(&corrected).unwrap();
        for key in [
            "Effect",
            "dof1",
            "dof2",
            "F",
            "p_unc",
            "sphericity",
            "p-GG-corr",
            "W-Mauchly",
            "p-Mauchly",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["Effect"], "time");
        assert!(json.get("correction").is_none());

        let plain = rm_anova_matrix(&sample(), "time", 0.01).unwrap();
        let json: serde_json::Value = serde_json::to_value(&plain).unwrap();
        assert!(json.get("p-GG-corr").is_none());
        assert!(json.get("W-Mauchly").is_none());
    }

    #[test]
    fn test_greenhouse_geisser_clipping() {
        let data = sample();
        // alpha = 1 forces the correction path
        let result = rm_anova_matrix(&data, "time", 1.0).unwrap();
        assert!(!result.sphericity);
        let gg = result.correction.clone().unwrap();
        assert!(gg.epsilon <= 1.0);
        if gg.epsilon < 1.0 {
            assert!(gg.dof1 <= result.dof1 as f64);
        } else {
            assert_eq!(gg.dof1, result.dof1 as f64);
            assert_eq!(gg.p_corr, result.p_unc);
        }
        assert_eq!(result.p_value(), gg.p_corr);
    }
}
