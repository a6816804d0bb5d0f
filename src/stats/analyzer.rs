//! Configured entry point for every test in the crate

use ndarray::Array2;

use super::categorical::mcnemar::{mcnemar_tests, McNemar};
use super::categorical::power_divergence::{power_divergence_family, Chi2Independence};
use super::categorical::{crosstab, dichotomous_crosstab, warn_low_counts};
use super::parametric::assumptions::{self, Homoscedasticity, Normality};
use super::parametric::rm_anova::{self, RmAnova};
use super::parametric::sphericity::{self, Sphericity};
use crate::config::StatsConfig;
use crate::core::error::Result;
use crate::dataframe::DataFrame;

/// Runs tests under a shared [`StatsConfig`]
#[derive(Debug, Clone, Default)]
pub struct StatisticalAnalyzer {
    config: StatsConfig,
}

impl StatisticalAnalyzer {
    /// Analyzer over a validated configuration
    pub fn new(config: StatsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Enable or disable continuity corrections
    pub fn with_correction(mut self, correction: bool) -> Self {
        self.config.correction = correction;
        self
    }

    /// Significance level for assumption checks
    pub fn with_alpha(mut self, alpha: f64) -> Result<Self> {
        self.config.alpha = alpha;
        self.config.validate()?;
        Ok(self)
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Chi-square tests of independence between columns `x` and `y`
    pub fn chi2_independence(&self, df: &DataFrame, x: &str, y: &str) -> Result<Chi2Independence> {
        let observed = crosstab(df, x, y)?;
        let expected = observed.expected_frequencies()?;

        warn_low_counts(
            &[("observed", &observed), ("expected", &expected)],
            self.config.low_count_threshold,
        );

        let (corrected, tests) = power_divergence_family(
            &observed,
            &expected,
            self.config.correction,
            self.config.decimals,
        )?;

        Ok(Chi2Independence {
            expected,
            observed,
            corrected,
            tests,
        })
    }

    /// McNemar's tests on two paired dichotomous columns
    pub fn chi2_mcnemar(&self, df: &DataFrame, x: &str, y: &str) -> Result<McNemar> {
        let observed = dichotomous_crosstab(df, x, y)?;
        let tests = mcnemar_tests(&observed, self.config.correction, self.config.decimals)?;
        Ok(McNemar { observed, tests })
    }

    /// Mauchly's test at the configured `alpha`
    pub fn sphericity(&self, data: &Array2<f64>) -> Result<Sphericity> {
        sphericity::sphericity(data, self.config.alpha)
    }

    /// Repeated-measures ANOVA on a balanced long table without subject column
    pub fn rm_anova(&self, df: &DataFrame, dv: &str, within: &str) -> Result<RmAnova> {
        rm_anova::rm_anova(df, dv, within, self.config.sphericity_alpha)
    }

    /// Repeated-measures ANOVA keyed by an explicit subject column
    pub fn rm_anova_with_subject(
        &self,
        df: &DataFrame,
        dv: &str,
        within: &str,
        subject: &str,
    ) -> Result<RmAnova> {
        rm_anova::rm_anova_with_subject(df, dv, within, subject, self.config.sphericity_alpha)
    }

    /// Shapiro-Wilk normality of each sample
    pub fn normality(&self, samples: &[&[f64]]) -> Result<Vec<Normality>> {
        assumptions::normality(samples, self.config.alpha)
    }

    /// Equality of variances across samples
    pub fn homoscedasticity(&self, samples: &[&[f64]]) -> Result<Homoscedasticity> {
        assumptions::homoscedasticity(samples, self.config.alpha)
    }

    /// Shapiro-Wilk normality of `dv` within each level of `group`, in order of first appearance
    pub fn group_normality(&self, df: &DataFrame, dv: &str, group: &str) -> Result<Vec<Normality>> {
        let groups = df.group_values(group, dv)?;
        let samples: Vec<&[f64]> = groups.iter().map(|g| g.values.as_slice()).collect();
        self.normality(&samples)
    }

    /// Equality of the variances of `dv` across the levels of `group`
    pub fn group_homoscedasticity(
        &self,
        df: &DataFrame,
        dv: &str,
        group: &str,
    ) -> Result<Homoscedasticity> {
        let groups = df.group_values(group, dv)?;
        let samples: Vec<&[f64]> = groups.iter().map(|g| g.values.as_slice()).collect();
        self.homoscedasticity(&samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_value::Value;

    fn treatment_frame() -> DataFrame {
        // 20 (0,0), 40 (0,1), 8 (1,0), 12 (1,1)
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (a, b, count) in [(0, 0, 20), (0, 1, 40), (1, 0, 8), (1, 1, 12)] {
            for _ in 0..count {
                x.push(Value::from(a));
                y.push(Value::from(b));
            }
        }
        DataFrame::from_columns(vec![("treatment_X", x), ("treatment_Y", y)]).unwrap()
    }

    #[test]
    fn test_mcnemar_through_analyzer() {
        let result = StatisticalAnalyzer::default()
            .chi2_mcnemar(&treatment_frame(), "treatment_X", "treatment_Y")
            .unwrap();
        assert_eq!(result.observed.cells, vec![vec![20.0, 40.0], vec![8.0, 12.0]]);
        assert_eq!(result.exact().statistic, 8.0);
        assert_eq!(result.approximated().statistic, 20.021);

        let uncorrected = StatisticalAnalyzer::default()
            .with_correction(false)
            .chi2_mcnemar(&treatment_frame(), "treatment_X", "treatment_Y")
            .unwrap();
        // (32)^2 / 48
        assert_eq!(uncorrected.approximated().statistic, 21.333);
    }

    #[test]
    fn test_decimals_follow_config() {
        let config = StatsConfig {
            decimals: 1,
            ..StatsConfig::default()
        };
        let result = StatisticalAnalyzer::new(config)
            .unwrap()
            .chi2_mcnemar(&treatment_frame(), "treatment_X", "treatment_Y")
            .unwrap();
        assert_eq!(result.approximated().statistic, 20.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StatsConfig {
            decimals: 400,
            ..StatsConfig::default()
        };
        assert!(StatisticalAnalyzer::new(config).is_err());
        assert!(StatisticalAnalyzer::default().with_alpha(1.5).is_err());
        assert_eq!(
            StatisticalAnalyzer::default()
                .with_alpha(0.1)
                .unwrap()
                .config()
                .alpha,
            0.1
        );
    }

    #[test]
    fn test_group_checks_match_sample_checks() {
        let a = [4.2, 5.1, 3.9, 4.8, 5.5, 4.4];
        let b = [6.1, 5.8, 6.6, 7.0, 5.9, 6.4];
        let mut group = Vec::new();
        let mut score = Vec::new();
        for (x, y) in a.iter().zip(&b) {
            group.push(Value::from("a"));
            score.push(Value::Float(*x));
            group.push(Value::from("b"));
            score.push(Value::Float(*y));
        }
        let df = DataFrame::from_columns(vec![("group", group), ("score", score)]).unwrap();

        let analyzer = StatisticalAnalyzer::default();
        assert_eq!(
            analyzer.group_normality(&df, "score", "group").unwrap(),
            analyzer.normality(&[&a, &b]).unwrap()
        );
        assert_eq!(
            analyzer.group_homoscedasticity(&df, "score", "group").unwrap(),
            analyzer.homoscedasticity(&[&a, &b]).unwrap()
        );
    }

    #[test]
    fn test_independence_keeps_original_table() {
        let result = StatisticalAnalyzer::default()
            .chi2_independence(&treatment_frame(), "treatment_X", "treatment_Y")
            .unwrap();
        assert_eq!(result.observed.cells, vec![vec![20.0, 40.0], vec![8.0, 12.0]]);
        assert!(result.corrected.is_some());
        assert_eq!(result.tested(), result.corrected.as_ref().unwrap());
        assert_eq!(result.tests.len(), 6);
    }
}
