//! statframe Statistics Module
//!
//! Association tests on contingency tables (power-divergence family and
//! McNemar's paired test) and the one-way repeated-measures ANOVA together
//! with its assumption checks (Mauchly's sphericity, normality,
//! homoscedasticity).

// Feature modules
pub mod analyzer;
pub mod categorical;
pub mod distributions;
pub mod linalg;
pub mod parametric;

use crate::core::error::Result;
use crate::dataframe::DataFrame;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use analyzer::StatisticalAnalyzer;
pub use categorical::mcnemar::McNemar;
pub use categorical::power_divergence::{Chi2Independence, PowerDivergence};
pub use categorical::ContingencyTable;
pub use parametric::assumptions::{Homoscedasticity, HomoscedasticityMethod, Normality};
pub use parametric::rm_anova::{GreenhouseGeisser, RmAnova};
pub use parametric::sphericity::Sphericity;

/// Result of a single hypothesis test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name (e.g. `"pearson"`, `"mid-p"`)
    pub name: String,
    /// Power-divergence exponent, for tests of that family
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda: Option<f64>,
    /// Test statistic
    pub statistic: f64,
    /// Degrees of freedom
    pub dof: usize,
    /// p-value
    pub p_value: f64,
}

/// Round `value` to `decimals` places, half away from zero
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals.min(i32::MAX as u32) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Serialize any result of this module to pretty-printed JSON
pub fn to_json<T: Serialize>(result: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

// Public API functions

/// Chi-square tests of independence between two categorical columns
///
/// # Description
/// Cross-tabulates `x` against `y` and computes the six power-divergence
/// statistics (pearson, cressie-read, log-likelihood, freeman-tukey,
/// mod-log-likelihood, neyman). With `correction` and one degree of freedom,
/// Yates' continuity correction is applied to the observed table first.
///
/// # Example
/// ```rust
/// use statframe::dataframe::DataFrame;
/// use statframe::stats;
///
/// let df = DataFrame::from_columns(vec![
///     ("sex", vec![0, 0, 1, 1, 1, 0, 1, 1]),
///     ("target", vec![1, 1, 0, 0, 1, 0, 0, 1]),
/// ])
/// .unwrap();
/// let result = stats::chi2_independence(&df, "sex", "target", true).unwrap();
/// assert_eq!(result.tests.len(), 6);
/// assert_eq!(result.tests[0].name, "pearson");
/// ```
pub fn chi2_independence(
    df: &DataFrame,
    x: &str,
    y: &str,
    correction: bool,
) -> Result<Chi2Independence> {
    StatisticalAnalyzer::default()
        .with_correction(correction)
        .chi2_independence(df, x, y)
}

/// Exact, mid-p and approximated McNemar tests on two dichotomous columns
///
/// # Description
/// Each row is one subject (or one matched pair) measured twice. Values are
/// mapped to 0/1 through the dichotomous token table before tabulation.
///
/// # Example
/// ```rust
/// use statframe::dataframe::DataFrame;
/// use statframe::stats;
///
/// let df = DataFrame::from_columns(vec![
///     ("before", vec!["yes", "yes", "no", "no", "yes"]),
///     ("after", vec!["no", "no", "no", "yes", "no"]),
/// ])
/// .unwrap();
/// let result = stats::chi2_mcnemar(&df, "before", "after", true).unwrap();
/// assert_eq!(result.tests[0].name, "exact");
/// assert_eq!(result.tests[0].statistic, 1.0);
/// ```
pub fn chi2_mcnemar(df: &DataFrame, x: &str, y: &str, correction: bool) -> Result<McNemar> {
    StatisticalAnalyzer::default()
        .with_correction(correction)
        .chi2_mcnemar(df, x, y)
}

/// Mauchly's test of sphericity on a subjects × conditions matrix
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use statframe::stats;
///
/// let data = array![
///     [1.0, 1.0, 1.0],
///     [1.0, -1.0, -1.0],
///     [-1.0, 1.0, -1.0],
///     [-1.0, -1.0, 1.0],
/// ];
/// let result = stats::sphericity(&data, 0.05).unwrap();
/// assert!(result.sphericity);
/// ```
pub fn sphericity(data: &Array2<f64>, alpha: f64) -> Result<Sphericity> {
    parametric::sphericity::sphericity(data, alpha)
}

/// One-way repeated-measures ANOVA on a long-format table
///
/// # Description
/// Rows must be grouped by condition with the same subject order inside
/// every group; the design must be balanced. Use
/// [`rm_anova_with_subject`] when the table carries a subject column.
pub fn rm_anova(df: &DataFrame, dv: &str, within: &str) -> Result<RmAnova> {
    StatisticalAnalyzer::default().rm_anova(df, dv, within)
}

/// One-way repeated-measures ANOVA keyed by an explicit subject column
pub fn rm_anova_with_subject(
    df: &DataFrame,
    dv: &str,
    within: &str,
    subject: &str,
) -> Result<RmAnova> {
    StatisticalAnalyzer::default().rm_anova_with_subject(df, dv, within, subject)
}
