//! Repeated-measures tests
//!
//! Mauchly's sphericity, the one-way repeated-measures ANOVA on long tables
//! and the assumption checks around it.

use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use statframe::stats::parametric::{gzscore, rm_anova_matrix};
use statframe::stats::{self, HomoscedasticityMethod, StatisticalAnalyzer};
use statframe::{DataFrame, Error, StatsConfig, Value};

fn long_frame(data: &Array2<f64>, with_subject: bool) -> DataFrame {
    let (n, k) = data.dim();
    let mut subject = Vec::new();
    let mut time = Vec::new();
    let mut score = Vec::new();
    for j in 0..k {
        for i in 0..n {
            subject.push(Value::from(format!("s{}", i)));
            time.push(Value::from(format!("t{}", j)));
            score.push(Value::Float(data[[i, j]]));
        }
    }

    let mut columns = vec![("time", time), ("score", score)];
    if with_subject {
        columns.push(("subject", subject));
    }
    DataFrame::from_columns(columns).unwrap()
}

fn random_design(seed: u64, n: usize, k: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, k), |(_, j)| j as f64 + rng.random_range(-1.0..1.0))
}

#[test]
fn test_sphericity_on_uncorrelated_equal_variance_columns() {
    // Columns of a Hadamard-like design: equal variance, zero covariance
    let data = array![
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
    ];
    let result = stats::sphericity(&data, 0.05).unwrap();
    assert!(result.w > 0.0);
    assert!(result.sphericity);
    assert_eq!(result.dof, 3);
}

#[test]
fn test_sphericity_alpha_from_config() {
    let data = random_design(5, 12, 3);
    let strict = StatisticalAnalyzer::new(StatsConfig {
        alpha: 0.999_999,
        ..StatsConfig::default()
    })
    .unwrap()
    .sphericity(&data)
    .unwrap();
    let lenient = StatisticalAnalyzer::default().sphericity(&data).unwrap();
    assert_eq!(strict.w, lenient.w);
    assert_eq!(strict.p_value, lenient.p_value);
    assert_eq!(strict.sphericity, strict.p_value > 0.999_999);
}

#[test]
fn test_rm_anova_long_and_explicit_subject_agree() {
    let data = random_design(17, 10, 4);

    let implicit = stats::rm_anova(&long_frame(&data, false), "score", "time").unwrap();
    let explicit =
        stats::rm_anova_with_subject(&long_frame(&data, true), "score", "time", "subject")
            .unwrap();

    assert_eq!(implicit.effect, "time");
    assert_eq!(implicit.dof1, 3);
    assert_eq!(implicit.dof2, 27);
    assert_eq!(implicit.n_subjects, 10);
    assert_eq!(implicit, explicit);
}

#[test]
fn test_rm_anova_detects_condition_effect() {
    // Strong linear trend across conditions
    let data = random_design(23, 15, 3) * 0.1 + &array![[0.0, 5.0, 10.0]];
    let result = rm_anova_matrix(&data, "time", 0.01).unwrap();
    assert!(result.f > 100.0);
    assert!(result.p_value() < 1e-6);
}

#[test]
fn test_rm_anova_f_statistic() {
    let data = array![
        [10.0, 12.0, 15.0],
        [8.0, 11.0, 12.0],
        [9.0, 9.0, 14.0],
        [11.0, 14.0, 13.0],
        [7.0, 10.0, 12.0],
    ];
    let result = stats::rm_anova(&long_frame(&data, false), "score", "time").unwrap();
    assert!((result.f - 15.761904761904763).abs() < 1e-9);
    assert!(result.sphericity);
    assert!(result.correction.is_none());
}

#[test]
fn test_degenerate_covariance_still_reports_f() {
    // As many subjects as conditions
    let square = array![[1.0, 2.0, 4.0], [2.0, 4.0, 5.0], [3.0, 3.0, 7.0]];
    let result = stats::rm_anova(&long_frame(&square, false), "score", "time").unwrap();
    assert_eq!(result.n_subjects, 3);
    assert!(result.f.is_finite());
    assert!(!result.sphericity);
    assert_eq!(result.correction.as_ref().unwrap().w_mauchly, 0.0);

    // One condition without variance
    let constant = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
    let result = stats::rm_anova(&long_frame(&constant, false), "score", "time").unwrap();
    assert!((result.f - 15.0).abs() < 1e-9);
    assert!(result.p_unc > 0.0 && result.p_unc < 0.05);
    assert!(result.correction.is_some());
}

#[test]
fn test_greenhouse_geisser_dof_never_exceed_uncorrected() {
    for seed in 0..10 {
        let data = random_design(seed, 8, 4);
        // sphericity_alpha = 1 always rejects sphericity
        let result = rm_anova_matrix(&data, "time", 1.0).unwrap();
        let gg = result.correction.as_ref().unwrap();

        assert!(gg.epsilon <= 1.0);
        assert!(gg.dof1 >= 1.0 && gg.dof2 >= 1.0);
        if gg.epsilon < 1.0 {
            assert!(gg.dof1 <= result.dof1 as f64);
            assert!(gg.dof2 <= result.dof2 as f64);
        } else {
            assert_eq!(gg.dof1, result.dof1 as f64);
            assert_eq!(gg.dof2, result.dof2 as f64);
        }
    }
}

#[test]
fn test_unbalanced_design_is_rejected() {
    let df = DataFrame::from_columns(vec![
        (
            "time",
            vec!["a", "a", "a", "a", "b", "b", "b", "c", "c", "c", "c"],
        ),
        (
            "score",
            vec!["1", "2", "3", "4", "2", "3", "4", "5", "4", "3", "6"],
        ),
    ])
    .unwrap();
    match stats::rm_anova(&df, "score", "time") {
        Err(Error::UnbalancedDesign(message)) => assert!(message.contains("'b'")),
        other => panic!("expected UnbalancedDesign, got {:?}", other),
    }
}

#[test]
fn test_incomplete_subjects_are_dropped() {
    let data = random_design(31, 9, 3);
    let mut df = long_frame(&data, true);

    // Remove subject s0 from the last condition by blanking its score
    let mut scores = df.column("score").unwrap().to_vec();
    let last = scores.len() - 9;
    scores[last] = Value::Null;
    let mut rebuilt = DataFrame::new();
    for name in df.column_names() {
        let values = if name == "score" {
            scores.clone()
        } else {
            df.column(&name).unwrap().to_vec()
        };
        rebuilt.add_column(name, values).unwrap();
    }
    df = rebuilt;

    let result = stats::rm_anova_with_subject(&df, "score", "time", "subject").unwrap();
    assert_eq!(result.n_subjects, 8);

    let reference = rm_anova_matrix(&data.slice(ndarray::s![1.., ..]).to_owned(), "time", 0.01)
        .unwrap();
    assert!((result.f - reference.f).abs() < 1e-9);
}

#[test]
fn test_duplicate_subject_condition_pair() {
    let df = DataFrame::from_columns(vec![
        ("subject", vec!["s1", "s1", "s1", "s2"]),
        ("time", vec!["a", "a", "b", "a"]),
        ("score", vec!["1", "2", "3", "4"]),
    ])
    .unwrap();
    assert!(stats::rm_anova_with_subject(&df, "score", "time", "subject").is_err());
}

#[test]
fn test_missing_columns() {
    let data = random_design(1, 6, 2);
    let df = long_frame(&data, false);
    assert!(matches!(
        stats::rm_anova(&df, "nope", "time"),
        Err(Error::ColumnNotFound(_))
    ));
    assert!(matches!(
        stats::rm_anova(&df, "score", "nope"),
        Err(Error::ColumnNotFound(_))
    ));
}

#[test]
fn test_assumption_checks() {
    let analyzer = StatisticalAnalyzer::default();
    let a = [4.2, 5.1, 3.9, 4.8, 5.5, 4.4, 5.0, 4.6];
    let b = [6.1, 5.8, 6.6, 7.0, 5.9, 6.4, 6.2, 6.8];

    let normality = analyzer.normality(&[&a, &b]).unwrap();
    assert_eq!(normality.len(), 2);
    for result in &normality {
        assert!(result.w > 0.0 && result.w <= 1.0);
        assert_eq!(result.normal, result.p_value > 0.05);
    }

    let equal_var = analyzer.homoscedasticity(&[&a, &b]).unwrap();
    let expected_method = if normality.iter().all(|n| n.normal) {
        HomoscedasticityMethod::Bartlett
    } else {
        HomoscedasticityMethod::Levene
    };
    assert_eq!(equal_var.method, expected_method);
    assert_eq!(equal_var.equal_var, equal_var.p_value > 0.05);
}

#[test]
fn test_gzscore_is_scale_free() {
    let x = [1.5, 2.0, 3.5, 8.0, 0.4];
    let scaled: Vec<f64> = x.iter().map(|v| v * 10.0).collect();
    let z1 = gzscore(&x).unwrap();
    let z2 = gzscore(&scaled).unwrap();
    for (a, b) in z1.iter().zip(&z2) {
        assert!((a - b).abs() < 1e-12);
    }
    assert!(z1.iter().sum::<f64>().abs() < 1e-12);
}
