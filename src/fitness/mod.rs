pub mod metrics;

use crate::error::{EvoVisionError, Result};
use crate::genome::Individual;
use crate::types::ConfusionCounts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The metrics the evaluator can score an individual with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Precision,
    Recall,
    Accuracy,
    FScore,
    Iou,
    Mcc,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Precision,
        MetricKind::Recall,
        MetricKind::Accuracy,
        MetricKind::FScore,
        MetricKind::Iou,
        MetricKind::Mcc,
    ];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Precision => "precision",
            MetricKind::Recall => "recall",
            MetricKind::Accuracy => "accuracy",
            MetricKind::FScore => "fscore",
            MetricKind::Iou => "iou",
            MetricKind::Mcc => "mcc",
        };
        f.write_str(name)
    }
}

impl FromStr for MetricKind {
    type Err = EvoVisionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "precision" => Ok(MetricKind::Precision),
            "recall" => Ok(MetricKind::Recall),
            "accuracy" => Ok(MetricKind::Accuracy),
            "fscore" | "f-score" | "fbeta" => Ok(MetricKind::FScore),
            "iou" => Ok(MetricKind::Iou),
            "mcc" => Ok(MetricKind::Mcc),
            other => Err(EvoVisionError::Configuration(format!(
                "unsupported metric: {other}"
            ))),
        }
    }
}

/// Optional hard limits that penalize otherwise-valid individuals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessThresholds {
    /// Maximum mean connected-region count per item.
    pub max_region_count: Option<f64>,
    /// Maximum mean pipeline execution time per item, in ms.
    pub max_execution_ms: Option<f64>,
    /// Minimum mean foreground pixel fraction per item.
    pub min_pixel_fraction: Option<f64>,
}

/// Mean per-item resource statistics for one evaluation epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationStats {
    pub mean_region_count: f64,
    pub mean_execution_ms: f64,
    pub mean_foreground_fraction: f64,
}

impl FitnessThresholds {
    pub fn breached(&self, stats: &EvaluationStats) -> bool {
        if let Some(max) = self.max_region_count {
            if stats.mean_region_count > max {
                return true;
            }
        }
        if let Some(max) = self.max_execution_ms {
            if stats.mean_execution_ms > max {
                return true;
            }
        }
        if let Some(min) = self.min_pixel_fraction {
            if stats.mean_foreground_fraction < min {
                return true;
            }
        }
        false
    }
}

/// Which metrics apply, with what weights, and in which direction.
///
/// Metric and weight arrays must have equal length; this is validated at
/// construction and never re-checked on the hot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessConfig {
    metrics: Vec<MetricKind>,
    weights: Vec<f64>,
    maximize: bool,
    beta_squared: f64,
    thresholds: FitnessThresholds,
}

impl FitnessConfig {
    pub fn new(metrics: Vec<MetricKind>, weights: Vec<f64>, maximize: bool) -> Result<Self> {
        if metrics.is_empty() {
            return Err(EvoVisionError::Configuration(
                "at least one fitness metric is required".to_string(),
            ));
        }
        if metrics.len() != weights.len() {
            return Err(EvoVisionError::Configuration(format!(
                "metric/weight length mismatch: {} metrics, {} weights",
                metrics.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(EvoVisionError::Configuration(
                "weights must be finite and positive".to_string(),
            ));
        }
        Ok(Self {
            metrics,
            weights,
            maximize,
            beta_squared: 1.0,
            thresholds: FitnessThresholds::default(),
        })
    }

    /// Single equally-weighted metric, maximizing.
    pub fn single(metric: MetricKind) -> Self {
        Self {
            metrics: vec![metric],
            weights: vec![1.0],
            maximize: true,
            beta_squared: 1.0,
            thresholds: FitnessThresholds::default(),
        }
    }

    pub fn with_beta_squared(mut self, beta_squared: f64) -> Self {
        self.beta_squared = beta_squared;
        self
    }

    pub fn with_thresholds(mut self, thresholds: FitnessThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn metrics(&self) -> &[MetricKind] {
        &self.metrics
    }

    pub fn maximize(&self) -> bool {
        self.maximize
    }

    pub fn thresholds(&self) -> &FitnessThresholds {
        &self.thresholds
    }

    /// Sentinel worst-possible weighted fitness for the configured direction.
    pub fn worst(&self) -> f64 {
        if self.maximize {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    }

    /// True when `a` is strictly better than `b` in the configured direction.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.maximize {
            a > b
        } else {
            a < b
        }
    }

    /// Compute every configured metric from aggregate confusion counts.
    pub fn score_counts(&self, counts: &ConfusionCounts) -> HashMap<MetricKind, f64> {
        let tp = counts.true_positives as f64;
        let tn = counts.true_negatives as f64;
        let fp = counts.false_positives as f64;
        let fn_ = counts.false_negatives as f64;

        self.metrics
            .iter()
            .map(|&metric| {
                let value = match metric {
                    MetricKind::Precision => metrics::precision(tp, fp),
                    MetricKind::Recall => metrics::recall(tp, fn_),
                    MetricKind::Accuracy => metrics::accuracy(tp, tn, fp, fn_),
                    MetricKind::FScore => metrics::f_beta(
                        metrics::precision(tp, fp),
                        metrics::recall(tp, fn_),
                        self.beta_squared,
                    ),
                    // Segmentation IoU: intersection = tp, union = tp+fp+fn.
                    MetricKind::Iou => metrics::iou(tp, tp + fp + fn_),
                    MetricKind::Mcc => metrics::mcc(tp, tn, fp, fn_),
                };
                (metric, value)
            })
            .collect()
    }

    /// Normalized weighted sum over the individual's scores, or the sentinel
    /// worst value when the individual is unevaluated, missing a required
    /// metric, or threshold-penalized.
    pub fn weighted_fitness(&self, individual: &Individual) -> f64 {
        if individual.penalized {
            return self.worst();
        }
        let Some(scores) = &individual.scores else {
            return self.worst();
        };
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for (metric, weight) in self.metrics.iter().zip(&self.weights) {
            let Some(value) = scores.get(metric) else {
                return self.worst();
            };
            weighted_sum += value * weight;
            weight_sum += weight;
        }
        weighted_sum / weight_sum
    }
}
