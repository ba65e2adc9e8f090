use serde::{Deserialize, Serialize};

/// Identifier of a node in the program graph. Program inputs occupy
/// `0..input_count`, computational nodes follow column-major.
pub type NodeId = usize;

/// Identifier of an image operator supplied by an `OperatorSet`.
pub type OperatorId = usize;

/// Pixel-level confusion matrix accumulated over evaluated items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: u64,
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

impl ConfusionCounts {
    pub fn new(tp: u64, tn: u64, fp: u64, fn_: u64) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    pub fn merge(&mut self, other: &ConfusionCounts) {
        self.true_positives += other.true_positives;
        self.true_negatives += other.true_negatives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

/// Result of running one candidate program against one dataset item.
///
/// Produced by the external pipeline executor; the core only aggregates it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemOutcome {
    pub counts: ConfusionCounts,
    /// Connected regions in the produced segmentation.
    pub region_count: usize,
    /// Wall-clock execution time of the pipeline on this item.
    pub execution_ms: f64,
    /// Fraction of pixels marked foreground, in `[0, 1]`.
    pub foreground_fraction: f64,
}
