//! Classification metrics for binary labels
//!
//! Curves are returned as point sequences so the presentation layer can plot
//! them without recomputing anything.

use anyhow::Result;
use faer::Mat;
use serde::Serialize;

use super::error::PipelineError;
use super::model::FittedModel;

fn check_lengths(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        anyhow::bail!(PipelineError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Share of predictions equal to the true label
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> Result<f64> {
    check_lengths(y_true.len(), y_pred.len())?;
    if y_true.is_empty() {
        anyhow::bail!(PipelineError::UndefinedMetric {
            metric: "accuracy".to_string(),
            reason: "no samples".to_string(),
        });
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// 2×2 counts indexed `[actual][predicted]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn true_negatives(&self) -> usize {
        self.counts[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.counts[1][1]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.true_positives() + self.true_negatives()) as f64 / total as f64
        }
    }
}

pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> Result<ConfusionMatrix> {
    check_lengths(y_true.len(), y_pred.len())?;
    let mut counts = [[0usize; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        counts[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
    }
    Ok(ConfusionMatrix { counts })
}

/// Precision, recall, F1 and support of one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics with macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Build the classification report. Undefined ratios (zero division) are 0.
pub fn classification_report(y_true: &[u8], y_pred: &[u8]) -> Result<ClassificationReport> {
    let cm = confusion_matrix(y_true, y_pred)?;
    let accuracy = accuracy(y_true, y_pred)?;

    let classes: Vec<ClassMetrics> = (0..2usize)
        .map(|label| {
            let other = 1 - label;
            let tp = cm.counts[label][label];
            let predicted = tp + cm.counts[other][label];
            let support = tp + cm.counts[label][other];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            ClassMetrics {
                label: label as u8,
                precision,
                recall,
                f1: f1_score(precision, recall),
                support,
            }
        })
        .collect();

    let total: usize = classes.iter().map(|c| c.support).sum();
    let k = classes.len() as f64;
    let macro_avg = AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / k,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / k,
        support: total,
    };

    let weighted = |metric: fn(&ClassMetrics) -> f64| -> f64 {
        if total == 0 {
            0.0
        } else {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        }
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1: weighted(|c| c.f1),
        support: total,
    };

    Ok(ClassificationReport {
        classes,
        accuracy,
        macro_avg,
        weighted_avg,
    })
}

/// A point on a curve; `threshold` is the score cut-off producing it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
    pub threshold: f64,
}

/// Cumulative (fp, tp, threshold) at each distinct score, highest score first
fn threshold_counts(y_true: &[u8], scores: &[f64]) -> Vec<(usize, usize, f64)> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut counts = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(pos + 1)
            .map(|&next| scores[next] != scores[i])
            .unwrap_or(true);
        if last_of_score {
            counts.push((fp, tp, scores[i]));
        }
    }
    counts
}

fn class_totals(metric: &str, y_true: &[u8], scores: &[f64]) -> Result<(usize, usize)> {
    check_lengths(y_true.len(), scores.len())?;
    let positives = y_true.iter().filter(|&&l| l == 1).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        anyhow::bail!(PipelineError::UndefinedMetric {
            metric: metric.to_string(),
            reason: format!(
                "both classes are required ({} positive, {} negative samples)",
                positives, negatives
            ),
        });
    }
    Ok((positives, negatives))
}

/// ROC curve: false-positive rate (x) against true-positive rate (y),
/// sweeping the threshold from high to low. Starts at (0, 0).
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Result<Vec<CurvePoint>> {
    let (positives, negatives) = class_totals("roc_curve", y_true, scores)?;

    let mut points = vec![CurvePoint {
        x: 0.0,
        y: 0.0,
        threshold: f64::INFINITY,
    }];
    points.extend(
        threshold_counts(y_true, scores)
            .into_iter()
            .map(|(fp, tp, threshold)| CurvePoint {
                x: fp as f64 / negatives as f64,
                y: tp as f64 / positives as f64,
                threshold,
            }),
    );
    Ok(points)
}

/// Trapezoidal area under a curve given in x order
pub fn auc(points: &[CurvePoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].x - w[0].x) * (w[1].y + w[0].y) / 2.0)
        .sum::<f64>()
        .abs()
}

pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Result<f64> {
    let (_, _) = class_totals("roc_auc", y_true, scores)?;
    Ok(auc(&roc_curve(y_true, scores)?))
}

/// Precision-recall curve: recall (x) against precision (y).
///
/// Points run from the lowest threshold reaching full recall up to the
/// highest threshold, followed by the conventional (recall 0, precision 1)
/// end point.
pub fn precision_recall_curve(y_true: &[u8], scores: &[f64]) -> Result<Vec<CurvePoint>> {
    let (positives, _) = class_totals("precision_recall_curve", y_true, scores)?;

    let mut points = Vec::new();
    for (fp, tp, threshold) in threshold_counts(y_true, scores) {
        points.push(CurvePoint {
            x: tp as f64 / positives as f64,
            y: tp as f64 / (tp + fp) as f64,
            threshold,
        });
        if tp == positives {
            break;
        }
    }
    points.reverse();
    points.push(CurvePoint {
        x: 0.0,
        y: 1.0,
        threshold: f64::INFINITY,
    });
    Ok(points)
}

/// A model weight paired with its feature name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub weight: f64,
}

/// Weights sorted descending; positive weights raise the predicted risk
pub fn feature_importances(model: &FittedModel, names: &[String]) -> Result<Vec<FeatureImportance>> {
    check_lengths(model.n_features(), names.len())?;
    let mut importances: Vec<FeatureImportance> = names
        .iter()
        .zip(model.weights())
        .map(|(name, &weight)| FeatureImportance {
            feature: name.clone(),
            weight,
        })
        .collect();
    importances.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(importances)
}

/// Everything computed on the holdout partition
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f64>,
    pub accuracy: f64,
    pub roc_auc: f64,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub roc_curve: Vec<CurvePoint>,
    pub precision_recall_curve: Vec<CurvePoint>,
    pub importances: Vec<FeatureImportance>,
}

/// Score a fitted model on holdout data
pub fn evaluate(
    model: &FittedModel,
    x_test: &Mat<f64>,
    y_test: &[u8],
    feature_names: &[String],
) -> Result<Evaluation> {
    let probabilities = model.predict_proba(x_test)?;
    let predictions = model.predict(x_test)?;

    Ok(Evaluation {
        accuracy: accuracy(y_test, &predictions)?,
        roc_auc: roc_auc(y_test, &probabilities)?,
        confusion: confusion_matrix(y_test, &predictions)?,
        report: classification_report(y_test, &predictions)?,
        roc_curve: roc_curve(y_test, &probabilities)?,
        precision_recall_curve: precision_recall_curve(y_test, &probabilities)?,
        importances: feature_importances(model, feature_names)?,
        predictions,
        probabilities,
    })
}
