use crate::fitness::MetricKind;
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Flat float-valued genome.
///
/// The genome is a fixed-length vector; what each position means (operator
/// id, connection, parameter, output selection) is decided by `CgpConfig`,
/// not by the genome itself. Keeping the encoding linear makes crossover a
/// slice swap and mutation a per-position redraw, and any genome produced by
/// the creators maps to a valid program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    genes: Vec<f64>,
}

impl Genotype {
    pub fn new(genes: Vec<f64>) -> Self {
        Self { genes }
    }

    pub fn zeroed(length: usize) -> Self {
        Self {
            genes: vec![0.0; length],
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn gene(&self, index: usize) -> f64 {
        self.genes[index]
    }

    pub fn set_gene(&mut self, index: usize, value: f64) {
        self.genes[index] = value;
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [f64] {
        &mut self.genes
    }
}

/// Boolean genome with a hard cap on the number of true bits.
///
/// Creation and mutation both respect the cap, so a genome never carries
/// more active bits than configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanGenotype {
    bits: Vec<bool>,
    max_true: usize,
}

impl BooleanGenotype {
    /// Random genome with at most `max_true` bits set.
    pub fn random(length: usize, max_true: usize, random: &dyn RandomSource) -> Self {
        let mut bits = vec![false; length];
        if length > 0 && max_true > 0 {
            let target = random.next_below(max_true.min(length) as i64 + 1) as usize;
            let mut set = 0;
            while set < target {
                let idx = random.next_below(length as i64) as usize;
                if !bits[idx] {
                    bits[idx] = true;
                    set += 1;
                }
            }
        }
        Self { bits, max_true }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bit(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn max_true(&self) -> usize {
        self.max_true
    }

    pub fn true_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Flip each bit with probability `flip_rate`. A false-to-true flip that
    /// would exceed the cap is skipped.
    pub fn mutate(&mut self, flip_rate: f64, random: &dyn RandomSource) {
        let mut trues = self.true_count();
        for i in 0..self.bits.len() {
            if random.next_f64() >= flip_rate {
                continue;
            }
            if self.bits[i] {
                self.bits[i] = false;
                trues -= 1;
            } else if trues < self.max_true {
                self.bits[i] = true;
                trues += 1;
            }
        }
    }
}

static NEXT_INDIVIDUAL_ID: AtomicU64 = AtomicU64::new(0);

/// One member of a population: a genome plus its per-metric scores.
///
/// Ids are monotonic and process-global. Individuals are never shared
/// between generations by reference; selection and variation go through
/// [`Individual::duplicate`], which deep-copies the genome under a fresh id.
#[derive(Debug, Clone)]
pub struct Individual {
    id: u64,
    pub genotype: Genotype,
    /// None until evaluated.
    pub scores: Option<HashMap<MetricKind, f64>>,
    /// Set by the evaluator when a threshold penalty applies.
    pub penalized: bool,
}

impl Individual {
    pub fn new(genotype: Genotype) -> Self {
        Self {
            id: NEXT_INDIVIDUAL_ID.fetch_add(1, Ordering::Relaxed),
            genotype,
            scores: None,
            penalized: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deep, independent copy under a fresh id. Scores carry over so an
    /// already-evaluated parent keeps its fitness.
    pub fn duplicate(&self) -> Individual {
        Self {
            id: NEXT_INDIVIDUAL_ID.fetch_add(1, Ordering::Relaxed),
            genotype: self.genotype.clone(),
            scores: self.scores.clone(),
            penalized: self.penalized,
        }
    }

    /// Drop evaluation results after the genome changed.
    pub fn invalidate_scores(&mut self) {
        self.scores = None;
        self.penalized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::MersenneTwister;

    #[test]
    fn test_individual_ids_are_unique() {
        let a = Individual::new(Genotype::zeroed(4));
        let b = Individual::new(Genotype::zeroed(4));
        let c = a.duplicate();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.genotype, c.genotype);
    }

    #[test]
    fn test_boolean_genotype_respects_cap() {
        let rng = MersenneTwister::new(21);
        for _ in 0..120 {
            let mut genome = BooleanGenotype::random(64, 5, &rng);
            assert!(genome.true_count() <= 5);
            for _ in 0..10 {
                genome.mutate(0.3, &rng);
                assert!(genome.true_count() <= 5);
            }
        }
    }

    #[test]
    fn test_boolean_genotype_empty() {
        let rng = MersenneTwister::new(2);
        let genome = BooleanGenotype::random(0, 3, &rng);
        assert!(genome.is_empty());
        assert_eq!(genome.true_count(), 0);
    }
}
