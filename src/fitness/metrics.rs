//! Confusion-matrix metric formulas.
//!
//! All inputs are non-negative counts passed as `f64`. Every
//! zero-denominator case returns 0 rather than NaN so a degenerate
//! confusion matrix scores as worst-case instead of poisoning aggregation.

/// `tp / (tp + fp)`, 0 when nothing was predicted positive.
pub fn precision(tp: f64, fp: f64) -> f64 {
    if tp + fp == 0.0 {
        0.0
    } else {
        tp / (tp + fp)
    }
}

/// `tp / (tp + fn)`, 0 when nothing is actually positive.
pub fn recall(tp: f64, fn_: f64) -> f64 {
    if tp + fn_ == 0.0 {
        0.0
    } else {
        tp / (tp + fn_)
    }
}

/// `(tp + tn) / (tp + tn + fp + fn)`, 0 on an empty matrix.
pub fn accuracy(tp: f64, tn: f64, fp: f64, fn_: f64) -> f64 {
    let total = tp + tn + fp + fn_;
    if total == 0.0 {
        0.0
    } else {
        (tp + tn) / total
    }
}

/// F-measure over precision and recall with a fixed beta squared.
pub fn f_beta(precision: f64, recall: f64, beta_squared: f64) -> f64 {
    if precision <= 0.0 && recall <= 0.0 {
        0.0
    } else {
        (1.0 + beta_squared) * recall * precision / (recall + beta_squared * precision)
    }
}

/// `intersection / union`, 0 when the union is empty.
pub fn iou(intersection: f64, union: f64) -> f64 {
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Matthews correlation coefficient.
///
/// Returns 0 when the matrix is degenerate: an empty matrix, or an actual
/// or predicted class that never occurs (`s` or `p` of 0 or 1).
pub fn mcc(tp: f64, tn: f64, fp: f64, fn_: f64) -> f64 {
    let n = tp + tn + fp + fn_;
    if n == 0.0 {
        return 0.0;
    }
    let s = (tp + fn_) / n;
    let p = (tp + fp) / n;
    if s == 0.0 || s == 1.0 || p == 0.0 || p == 1.0 {
        return 0.0;
    }
    (tp / n - s * p) / (p * s * (1.0 - p) * (1.0 - s)).sqrt()
}
