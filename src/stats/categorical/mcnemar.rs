//! McNemar's test for paired dichotomous measurements

use serde::{Deserialize, Serialize};

use super::ContingencyTable;
use crate::core::error::{Error, Result};
use crate::stats::distributions::{binom_cdf, binom_pmf, chi2_sf};
use crate::stats::{round_to, TestResult};

/// Result of McNemar's test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McNemar {
    /// 2×2 table of the dichotomized pairs, indexed `[0, 1] × [0, 1]`
    pub observed: ContingencyTable,
    /// `exact`, `mid-p` and `approximated`, in that order
    pub tests: Vec<TestResult>,
}

impl McNemar {
    pub fn exact(&self) -> &TestResult {
        &self.tests[0]
    }

    pub fn mid_p(&self) -> &TestResult {
        &self.tests[1]
    }

    pub fn approximated(&self) -> &TestResult {
        &self.tests[2]
    }
}

/// Discordant pair counts `(n1, n2) = (t[0][1], t[1][0])` of a 2×2 table
pub fn discordant_pairs(table: &ContingencyTable) -> Result<(u64, u64)> {
    if table.shape() != (2, 2) {
        return Err(Error::DimensionMismatch(format!(
            "McNemar's test needs a 2x2 table, got {:?}",
            table.shape()
        )));
    }

    let as_count = |v: f64| -> Result<u64> {
        if v.fract() != 0.0 {
            return Err(Error::InvalidValue(format!(
                "Discordant pair counts must be whole numbers, got {}",
                v
            )));
        }
        Ok(v as u64)
    };

    Ok((as_count(table.cells[0][1])?, as_count(table.cells[1][0])?))
}

/// Exact, mid-p and chi-square approximated McNemar tests on a 2×2 table.
///
/// Statistics and the mid-p value are rounded to `decimals`; the exact and
/// approximated p-values keep full precision.
pub fn mcnemar_tests(
    table: &ContingencyTable,
    correction: bool,
    decimals: u32,
) -> Result<Vec<TestResult>> {
    let (n1, n2) = discordant_pairs(table)?;
    let n = n1 + n2;
    if n == 0 {
        return Err(Error::NoDiscordantPairs);
    }

    let statistic = n1.min(n2);
    let exact_p = (2.0 * binom_cdf(statistic, n, 0.5)?).min(1.0);
    let mid_p = exact_p - binom_pmf(n2, n, 0.5)?;

    let c = if correction { 1.0 } else { 0.0 };
    let diff = (n1 as f64 - n2 as f64).abs() - c;
    let approx = diff * diff / n as f64;

    let result = |name: &str, statistic: f64, p_value: f64| TestResult {
        name: name.to_string(),
        lambda: None,
        statistic: round_to(statistic, decimals),
        dof: 1,
        p_value,
    };

    Ok(vec![
        result("exact", statistic as f64, exact_p),
        result("mid-p", statistic as f64, round_to(mid_p, decimals)),
        result("approximated", approx, chi2_sf(approx, 1.0)?),
    ])
}
