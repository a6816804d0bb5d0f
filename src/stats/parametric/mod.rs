//! Parametric tests on repeated measures
//!
//! Mauchly's sphericity test, the one-way repeated-measures ANOVA built on
//! top of it, and the normality / equal-variance checks that usually
//! precede a parametric analysis.

pub mod assumptions;
pub mod rm_anova;
pub mod sphericity;

pub use assumptions::{gzscore, homoscedasticity, normality};
pub use rm_anova::{rm_anova, rm_anova_matrix, rm_anova_with_subject};
pub use sphericity::sphericity;
