// Disable specific warnings
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

// Core module with fundamental data structures and error types
pub mod core;

// Test settings loaded from defaults, files and the environment
pub mod config;

// Column-oriented table used as input to every test
pub mod dataframe;

// Grouping and long-to-wide reshaping
pub mod pivot;

// Association tests and repeated-measures ANOVA
pub mod stats;

// Re-export core types
pub use core::data_value::Value;
pub use core::error::{Error, Result};

pub use config::StatsConfig;
pub use dataframe::DataFrame;
pub use pivot::{Group, WideTable};

// Re-export statistical API
pub use stats::{
    chi2_independence, chi2_mcnemar, rm_anova, rm_anova_with_subject, sphericity,
    Chi2Independence, ContingencyTable, GreenhouseGeisser, Homoscedasticity,
    HomoscedasticityMethod, McNemar, Normality, PowerDivergence, RmAnova, Sphericity,
    StatisticalAnalyzer, TestResult,
};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
