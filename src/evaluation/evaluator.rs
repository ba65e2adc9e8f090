use crate::cgp::{decode, CgpConfig, Phenotype};
use crate::data::{DataLoader, Dataset};
use crate::error::Result;
use crate::fitness::{EvaluationStats, FitnessConfig, MetricKind};
use crate::genome::{Genotype, Individual};
use crate::types::{ConfusionCounts, ItemOutcome};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Executes a decoded candidate program against one dataset item.
///
/// This is the seam to the concrete image backend: the core hands over the
/// phenotype (which nodes run, in what dependency order) plus the raw
/// genotype (for parameter genes) and gets back pixel-level counts. The
/// core never interprets what an operator does.
pub trait ProgramExecutor<Item>: Send + Sync {
    fn run(&self, program: &Phenotype, genotype: &Genotype, item: &Item)
        -> anyhow::Result<ItemOutcome>;
}

/// Aggregate statistics for one completed batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchStats {
    pub batch_index: usize,
    pub item_count: usize,
    pub failed_items: usize,
    pub counts: ConfusionCounts,
}

/// Observer of evaluation progress, invoked in registration order.
///
/// Consumed by external analyzers; the evolution loop itself never reads
/// these events.
pub trait EvaluationObserver: Send {
    fn on_individual_evaluated(&mut self, id: u64, scores: &HashMap<MetricKind, f64>) {
        let _ = (id, scores);
    }

    fn on_batch_evaluated(&mut self, stats: &BatchStats) {
        let _ = stats;
    }
}

/// Scores individuals against a dataset.
pub trait Evaluator {
    fn evaluate(&mut self, individual: &mut Individual) -> Result<()>;

    fn evaluate_all(&mut self, individuals: &mut [Individual]) -> Result<()> {
        for individual in individuals {
            self.evaluate(individual)?;
        }
        Ok(())
    }

    /// Total individuals scored since construction.
    fn individuals_evaluated(&self) -> usize;

    fn weighted_fitness_of(&self, individual: &Individual) -> f64;

    fn fitness_config(&self) -> &FitnessConfig;
}

/// Default evaluator: decodes the individual once, runs one loader epoch,
/// scores items batch by batch (items within a batch in parallel), and
/// aggregates the confusion counts into the configured metrics.
///
/// Per-item failures are logged and contribute zero counts; a failed item
/// never aborts its batch or the enclosing generation.
pub struct BatchEvaluator<D: Dataset, E: ProgramExecutor<D::Item>> {
    loader: DataLoader<D>,
    executor: E,
    config: Arc<CgpConfig>,
    fitness: FitnessConfig,
    observers: Vec<Box<dyn EvaluationObserver>>,
    evaluated: usize,
}

impl<D, E> BatchEvaluator<D, E>
where
    D: Dataset + 'static,
    D::Item: Sync,
    E: ProgramExecutor<D::Item>,
{
    pub fn new(
        loader: DataLoader<D>,
        executor: E,
        config: Arc<CgpConfig>,
        fitness: FitnessConfig,
    ) -> Self {
        Self {
            loader,
            executor,
            config,
            fitness,
            observers: Vec::new(),
            evaluated: 0,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn EvaluationObserver>) {
        self.observers.push(observer);
    }

    /// Run one epoch for this individual and aggregate the outcomes.
    ///
    /// An item that failed to load or to execute contributes zero counts;
    /// its batchmates are unaffected.
    fn run_epoch(&mut self, phenotype: &Phenotype, genotype: &Genotype) -> EpochTotals {
        let mut totals = EpochTotals::default();

        for (batch_index, batch) in self.loader.epoch().enumerate() {
            let outcomes: Vec<Option<ItemOutcome>> = batch
                .items
                .par_iter()
                .map(|item| {
                    let item = match item {
                        Ok(item) => item,
                        // Already logged by the loader.
                        Err(_) => return None,
                    };
                    match self.executor.run(phenotype, genotype, item) {
                        Ok(outcome) => Some(outcome),
                        Err(e) => {
                            log::warn!("item evaluation failed, scoring as zero: {e}");
                            None
                        }
                    }
                })
                .collect();

            let mut batch_counts = ConfusionCounts::default();
            let mut failed = 0usize;
            for outcome in outcomes.iter() {
                match outcome {
                    Some(outcome) => {
                        batch_counts.merge(&outcome.counts);
                        totals.region_count += outcome.region_count as f64;
                        totals.execution_ms += outcome.execution_ms;
                        totals.foreground_fraction += outcome.foreground_fraction;
                    }
                    None => failed += 1,
                }
            }
            totals.counts.merge(&batch_counts);
            totals.item_count += batch.len();
            totals.failed_items += failed;

            let stats = BatchStats {
                batch_index,
                item_count: batch.len(),
                failed_items: failed,
                counts: batch_counts,
            };
            for observer in &mut self.observers {
                observer.on_batch_evaluated(&stats);
            }
        }
        totals
    }
}

#[derive(Debug, Default)]
struct EpochTotals {
    counts: ConfusionCounts,
    region_count: f64,
    execution_ms: f64,
    foreground_fraction: f64,
    item_count: usize,
    failed_items: usize,
}

impl EpochTotals {
    fn stats(&self) -> EvaluationStats {
        let scored = (self.item_count - self.failed_items).max(1) as f64;
        EvaluationStats {
            mean_region_count: self.region_count / scored,
            mean_execution_ms: self.execution_ms / scored,
            mean_foreground_fraction: self.foreground_fraction / scored,
        }
    }
}

impl<D, E> Evaluator for BatchEvaluator<D, E>
where
    D: Dataset + 'static,
    D::Item: Sync,
    E: ProgramExecutor<D::Item>,
{
    fn evaluate(&mut self, individual: &mut Individual) -> Result<()> {
        let phenotype = decode(&individual.genotype, &self.config);
        let genotype = individual.genotype.clone();
        let totals = self.run_epoch(&phenotype, &genotype);

        let scores = self.fitness.score_counts(&totals.counts);
        individual.penalized = self.fitness.thresholds().breached(&totals.stats());
        individual.scores = Some(scores.clone());

        self.evaluated += 1;
        for observer in &mut self.observers {
            observer.on_individual_evaluated(individual.id(), &scores);
        }
        Ok(())
    }

    fn individuals_evaluated(&self) -> usize {
        self.evaluated
    }

    fn weighted_fitness_of(&self, individual: &Individual) -> f64 {
        self.fitness.weighted_fitness(individual)
    }

    fn fitness_config(&self) -> &FitnessConfig {
        &self.fitness
    }
}
