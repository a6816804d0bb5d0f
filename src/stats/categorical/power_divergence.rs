//! Cressie-Read power-divergence family
//!
//! A single statistic indexed by `λ` covers Pearson's chi-square (`λ = 1`),
//! the G-test (`λ = 0`) and four other classical goodness-of-fit measures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{check_same_shape, ContingencyTable};
use crate::core::error::{Error, Result};
use crate::stats::distributions::chi2_sf;
use crate::stats::{round_to, TestResult};

/// Members of the power-divergence family reported by the independence test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerDivergence {
    /// `λ = 1`
    Pearson,
    /// `λ = 2/3`
    CressieRead,
    /// `λ = 0`, the G-test
    LogLikelihood,
    /// `λ = -1/2`
    FreemanTukey,
    /// `λ = -1`
    ModLogLikelihood,
    /// `λ = -2`
    Neyman,
}

impl PowerDivergence {
    /// Every member, in reporting order
    pub const ALL: [PowerDivergence; 6] = [
        PowerDivergence::Pearson,
        PowerDivergence::CressieRead,
        PowerDivergence::LogLikelihood,
        PowerDivergence::FreemanTukey,
        PowerDivergence::ModLogLikelihood,
        PowerDivergence::Neyman,
    ];

    pub fn lambda(&self) -> f64 {
        match self {
            PowerDivergence::Pearson => 1.0,
            PowerDivergence::CressieRead => 2.0 / 3.0,
            PowerDivergence::LogLikelihood => 0.0,
            PowerDivergence::FreemanTukey => -0.5,
            PowerDivergence::ModLogLikelihood => -1.0,
            PowerDivergence::Neyman => -2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PowerDivergence::Pearson => "pearson",
            PowerDivergence::CressieRead => "cressie-read",
            PowerDivergence::LogLikelihood => "log-likelihood",
            PowerDivergence::FreemanTukey => "freeman-tukey",
            PowerDivergence::ModLogLikelihood => "mod-log-likelihood",
            PowerDivergence::Neyman => "neyman",
        }
    }

    /// Divergence between paired observed and expected frequencies
    pub fn statistic(&self, observed: &[f64], expected: &[f64]) -> f64 {
        divergence(self.lambda(), observed, expected)
    }
}

impl fmt::Display for PowerDivergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PowerDivergence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PowerDivergence::ALL
            .into_iter()
            .find(|method| method.name() == s)
            .ok_or_else(|| Error::InvalidValue(format!("Unknown power-divergence method: {}", s)))
    }
}

/// Power-divergence statistic for an arbitrary `λ`.
///
/// `λ = 0` and `λ = -1` use their logarithmic limits. Cells with zero
/// observed count contribute their limiting value: nothing when `λ > -1`,
/// an infinite divergence otherwise. Cells with zero expectation are
/// skipped.
pub fn divergence(lambda: f64, observed: &[f64], expected: &[f64]) -> f64 {
    let terms = observed.iter().zip(expected).filter(|&(_, &e)| e > 0.0);

    if lambda == 0.0 {
        2.0 * terms
            .map(|(&o, &e)| if o == 0.0 { 0.0 } else { o * (o / e).ln() })
            .sum::<f64>()
    } else if lambda == -1.0 {
        2.0 * terms
            .map(|(&o, &e)| {
                if o == 0.0 {
                    f64::INFINITY
                } else {
                    e * (e / o).ln()
                }
            })
            .sum::<f64>()
    } else {
        let sum: f64 = terms
            .map(|(&o, &e)| {
                if o == 0.0 {
                    if lambda > -1.0 {
                        0.0
                    } else {
                        f64::INFINITY
                    }
                } else {
                    o * ((o / e).powf(lambda) - 1.0)
                }
            })
            .sum();
        2.0 * sum / (lambda * (lambda + 1.0))
    }
}

/// Result of the chi-square test of independence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chi2Independence {
    /// Expected frequencies under independence
    pub expected: ContingencyTable,
    /// Observed frequencies, as tabulated
    pub observed: ContingencyTable,
    /// Observed frequencies after Yates' correction, when it was applied
    pub corrected: Option<ContingencyTable>,
    /// One row per member of the family, in [`PowerDivergence::ALL`] order
    pub tests: Vec<TestResult>,
}

impl Chi2Independence {
    /// Look up a test row by name
    pub fn test(&self, method: PowerDivergence) -> Option<&TestResult> {
        self.tests.iter().find(|t| t.name == method.name())
    }

    /// The table the statistics were computed on
    pub fn tested(&self) -> &ContingencyTable {
        self.corrected.as_ref().unwrap_or(&self.observed)
    }
}

/// Compute all six power-divergence tests with 3-decimal rounding
pub fn power_divergence_all(
    observed: &ContingencyTable,
    expected: &ContingencyTable,
    correction: bool,
) -> Result<Vec<TestResult>> {
    Ok(power_divergence_family(observed, expected, correction, 3)?.1)
}

/// Run the family on a table pair; returns the Yates-corrected table, if any.
pub(crate) fn power_divergence_family(
    observed: &ContingencyTable,
    expected: &ContingencyTable,
    correction: bool,
    decimals: u32,
) -> Result<(Option<ContingencyTable>, Vec<TestResult>)> {
    check_same_shape(observed, expected)?;

    let dof = observed.dof();
    let corrected = if dof == 1 && correction {
        log::debug!("Applying Yates' continuity correction");
        Some(observed.yates_corrected(expected)?)
    } else {
        None
    };

    let obs = corrected.as_ref().unwrap_or(observed).flatten();
    let exp = expected.flatten();

    let mut tests = Vec::with_capacity(PowerDivergence::ALL.len());
    for method in PowerDivergence::ALL {
        let (statistic, p_value) = if dof == 0 {
            (0.0, 1.0)
        } else {
            let statistic = method.statistic(&obs, &exp);
            (statistic, chi2_sf(statistic, dof as f64)?)
        };

        tests.push(TestResult {
            name: method.name().to_string(),
            lambda: Some(round_to(method.lambda(), decimals)),
            statistic: round_to(statistic, decimals),
            dof,
            p_value,
        });
    }

    Ok((corrected, tests))
}
