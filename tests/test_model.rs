//! Tests for the logistic regression trainer

use faer::Mat;
use lungrisk::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn weight_norm(model: &FittedModel) -> f64 {
    model.weights().iter().map(|w| w * w).sum::<f64>().sqrt()
}

#[test]
fn test_separable_data_is_classified_perfectly() {
    let (x, y) = separable_problem(15);
    let model = LogisticRegression::default().fit(&x, &y).unwrap();

    assert!(model.converged());
    assert_eq!(model.predict(&x).unwrap(), y);
    assert_eq!(model.score(&x, &y).unwrap(), 1.0);
}

#[test]
fn test_predict_thresholds_probabilities_at_half() {
    let (x, y) = ten_row_problem();
    let model = LogisticRegression::new(1.0).fit(&x, &y).unwrap();

    let proba = model.predict_proba(&x).unwrap();
    let labels = model.predict(&x).unwrap();
    for (p, label) in proba.iter().zip(&labels) {
        assert!(*p > 0.0 && *p < 1.0);
        assert_eq!(*label, u8::from(*p > 0.5));
    }
}

#[test]
fn test_stronger_regularization_shrinks_weights() {
    let (x, y) = ten_row_problem();
    let weak = LogisticRegression::new(100.0).fit(&x, &y).unwrap();
    let strong = LogisticRegression::new(0.01).fit(&x, &y).unwrap();

    assert!(weight_norm(&strong) < weight_norm(&weak));
    assert_eq!(strong.c(), 0.01);
}

#[test]
fn test_intercept_is_not_penalized() {
    // No signal in the feature: the intercept alone must reach logit(3/4)
    let x = Mat::<f64>::zeros(8, 1);
    let y = vec![1, 1, 1, 0, 1, 1, 1, 0];
    let model = LogisticRegression::new(0.001).fit(&x, &y).unwrap();

    assert!(model.weights()[0].abs() < 1e-12);
    assert!((model.intercept() - 3f64.ln()).abs() < 1e-6);
}

#[test]
fn test_first_order_conditions_hold() {
    let (x, y) = ten_row_problem();
    let c = 2.0;
    let model = LogisticRegression::new(c).fit(&x, &y).unwrap();
    let proba = model.predict_proba(&x).unwrap();

    let residual_sum: f64 = proba.iter().zip(&y).map(|(p, &l)| p - f64::from(l)).sum();
    assert!(residual_sum.abs() < 1e-6, "intercept gradient {}", residual_sum);

    for j in 0..x.ncols() {
        let grad: f64 = (0..x.nrows())
            .map(|i| (proba[i] - f64::from(y[i])) * x[(i, j)])
            .sum::<f64>()
            + 2.0 / c * model.weights()[j];
        assert!(grad.abs() < 1e-6, "weight {} gradient {}", j, grad);
    }
}

#[test]
fn test_single_class_is_a_fit_error() {
    let x = Mat::from_fn(4, 1, |i, _| i as f64);
    let err = LogisticRegression::default().fit(&x, &[1, 1, 1, 1]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Fit(_))
    ));
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let (x, y) = ten_row_problem();

    assert!(LogisticRegression::new(0.0).fit(&x, &y).is_err());
    assert!(LogisticRegression::new(-1.0).fit(&x, &y).is_err());
    assert!(LogisticRegression::default().fit(&x, &y[..9]).is_err());
    assert!(LogisticRegression::default()
        .fit(&Mat::<f64>::zeros(0, 2), &[])
        .is_err());
}

#[test]
fn test_iteration_limit_is_not_an_error() {
    let (x, y) = ten_row_problem();
    let model = LogisticRegression::new(100.0)
        .with_max_iter(1)
        .fit(&x, &y)
        .unwrap();

    assert_eq!(model.n_iter(), 1);
    assert!(!model.converged());
}

#[test]
fn test_prediction_width_must_match() {
    let (x, y) = ten_row_problem();
    let model = LogisticRegression::default().fit(&x, &y).unwrap();
    assert!(model.predict(&Mat::<f64>::zeros(2, 3)).is_err());
}
