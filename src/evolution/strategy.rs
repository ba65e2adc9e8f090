use super::analyzer::{Analyzer, GenerationSnapshot};
use super::creator::{CgpCreator, Creator};
use super::mutation::{AdaptiveGaussianMutator, Mutator};
use super::recombination::{Recombinator, SinglePointRecombinator};
use super::selection::{
    BestSelector, RandomSelector, RouletteWheelSelector, Selector, TournamentSelector,
};
use super::termination::{GenerationCountTerminator, StrategyState, Terminator};
use crate::cgp::CgpConfig;
use crate::config::traits::ConfigSection;
use crate::config::{EvolutionSettings, SelectionMethod};
use crate::error::{EvoVisionError, Result};
use crate::evaluation::Evaluator;
use crate::fitness::FitnessConfig;
use crate::genome::Individual;
use crate::random::{EntropyRandom, MersenneTwister, RandomSource};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How population and offspring combine into the next population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Offspring replace the population outright.
    ReplaceAll,
    /// The best individual so far survives into the next population,
    /// replacing the worst offspring.
    Elitist,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct EvolutionOutcome {
    pub best: Individual,
    pub population: Vec<Individual>,
    pub generations: usize,
}

/// The generational orchestrator.
///
/// Control flow is single-threaded and, given a fixed seed and a worker
/// count of one in the evaluator, deterministic. Terminators are consulted
/// once per generation boundary; an in-flight evaluation is never
/// preempted.
pub struct EvolutionStrategy {
    population_size: usize,
    recombination_rate: f64,
    merge_policy: MergePolicy,
    creator: Box<dyn Creator>,
    mutator: Box<dyn Mutator>,
    recombinator: Option<Box<dyn Recombinator>>,
    selector: Box<dyn Selector>,
    terminators: Vec<Box<dyn Terminator>>,
    analyzers: Vec<Box<dyn Analyzer>>,
    random: Arc<dyn RandomSource>,
    population: Vec<Individual>,
    best: Option<Individual>,
    generation: usize,
}

impl EvolutionStrategy {
    pub fn new(
        population_size: usize,
        creator: Box<dyn Creator>,
        mutator: Box<dyn Mutator>,
        selector: Box<dyn Selector>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            population_size,
            recombination_rate: 0.0,
            merge_policy: MergePolicy::Elitist,
            creator,
            mutator,
            recombinator: None,
            selector,
            terminators: Vec::new(),
            analyzers: Vec::new(),
            random,
            population: Vec::new(),
            best: None,
            generation: 0,
        }
    }

    /// Assemble a strategy from file-backed settings for a given program
    /// configuration: selector, adaptive mutator, crossover, merge policy
    /// and generation ceiling all come from the `[evolution]` section.
    pub fn from_settings(settings: &EvolutionSettings, config: Arc<CgpConfig>) -> Result<Self> {
        settings.validate()?;

        let random: Arc<dyn RandomSource> = match settings.seed {
            Some(seed) => Arc::new(MersenneTwister::new(seed)),
            None => Arc::new(EntropyRandom::new()),
        };
        let selector: Box<dyn Selector> = match settings.selection_method {
            SelectionMethod::Best => Box::new(BestSelector),
            SelectionMethod::Random => Box::new(RandomSelector),
            SelectionMethod::Roulette => Box::new(RouletteWheelSelector),
            SelectionMethod::Tournament => Box::new(TournamentSelector::new(
                settings.tournament_size,
                settings.tournament_probability,
            )),
        };
        let mutator = AdaptiveGaussianMutator::new(
            Arc::clone(&config),
            settings.mutation_rate,
            settings.base_sigma,
            settings.sigma_step,
            settings.max_sigma,
        );

        let mut strategy = Self::new(
            settings.population_size,
            Box::new(CgpCreator::new(config)),
            Box::new(mutator),
            selector,
            random,
        )
        .with_recombinator(Box::new(SinglePointRecombinator), settings.crossover_rate)
        .with_merge_policy(settings.merge_policy);
        strategy.add_terminator(Box::new(GenerationCountTerminator::new(
            settings.generations,
        )));
        Ok(strategy)
    }

    pub fn with_recombinator(mut self, recombinator: Box<dyn Recombinator>, rate: f64) -> Self {
        self.recombinator = Some(recombinator);
        self.recombination_rate = rate;
        self
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub fn add_terminator(&mut self, terminator: Box<dyn Terminator>) {
        self.terminators.push(terminator);
    }

    pub fn add_analyzer(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Run until any terminator fires; returns the best individual and the
    /// final population.
    pub fn run(&mut self, evaluator: &mut dyn Evaluator) -> Result<EvolutionOutcome> {
        if self.population_size == 0 {
            return Err(EvoVisionError::Configuration(
                "population size must be at least 1".to_string(),
            ));
        }
        if self.terminators.is_empty() {
            return Err(EvoVisionError::Configuration(
                "at least one terminator is required".to_string(),
            ));
        }
        let fitness = evaluator.fitness_config().clone();

        self.generation = 0;
        self.best = None;
        self.population = self
            .creator
            .create(self.population_size, self.random.as_ref());
        evaluator.evaluate_all(&mut self.population)?;
        self.refresh_best(&fitness);

        while !self.should_stop(&fitness) {
            let parents = self.selector.select(
                &self.population,
                self.population_size,
                &fitness,
                self.random.as_ref(),
            );
            let mut offspring = self.breed(parents);
            evaluator.evaluate_all(&mut offspring)?;
            let improved = self.merge(offspring, &fitness);
            self.mutator.observe_generation(improved);

            let snapshot = self.snapshot(&fitness, evaluator.individuals_evaluated());
            for analyzer in &mut self.analyzers {
                analyzer.analyze(&snapshot);
            }
            log::debug!(
                "generation {} done: best={:.4} improved={}",
                self.generation,
                snapshot.best_fitness,
                improved
            );
            self.generation += 1;
        }

        let best = self.best.clone().ok_or_else(|| {
            EvoVisionError::Evaluation("run finished without an evaluated individual".to_string())
        })?;
        Ok(EvolutionOutcome {
            best,
            population: self.population.clone(),
            generations: self.generation,
        })
    }

    fn should_stop(&mut self, fitness: &FitnessConfig) -> bool {
        let best_fitness = self
            .best
            .as_ref()
            .map_or(fitness.worst(), |b| fitness.weighted_fitness(b));
        let state = StrategyState {
            generation: self.generation,
            best: self.best.as_ref(),
            best_fitness,
            population: &self.population,
        };
        let mut stop = false;
        for terminator in &mut self.terminators {
            if terminator.terminate(&state) {
                stop = true;
            }
        }
        stop
    }

    /// Pair up parents, recombine at the configured rate, then mutate every
    /// child. Children are independent copies; parents are dropped.
    fn breed(&mut self, parents: Vec<Individual>) -> Vec<Individual> {
        let mut offspring = Vec::with_capacity(self.population_size);
        let mut parents = parents.into_iter();

        while offspring.len() < self.population_size {
            let Some(first) = parents.next() else { break };
            match (&self.recombinator, parents.next()) {
                (Some(recombinator), Some(second))
                    if self.random.next_f64() < self.recombination_rate =>
                {
                    let (a, b) = recombinator.recombine(&first, &second, self.random.as_ref());
                    offspring.push(a);
                    if offspring.len() < self.population_size {
                        offspring.push(b);
                    }
                }
                (_, second) => {
                    offspring.push(first);
                    if let Some(second) = second {
                        if offspring.len() < self.population_size {
                            offspring.push(second);
                        }
                    }
                }
            }
        }
        // Selector under-delivered; fill with fresh individuals.
        while offspring.len() < self.population_size {
            offspring.extend(
                self.creator
                    .create(self.population_size - offspring.len(), self.random.as_ref()),
            );
        }

        for child in &mut offspring {
            self.mutator.mutate(child, self.random.as_ref());
        }
        offspring
    }

    /// Apply the merge policy and report whether the best fitness improved.
    fn merge(&mut self, mut offspring: Vec<Individual>, fitness: &FitnessConfig) -> bool {
        let previous = self.best.as_ref().map(|b| fitness.weighted_fitness(b));

        if self.merge_policy == MergePolicy::Elitist {
            if let Some(best) = &self.best {
                let worst = offspring
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        let fa = fitness.weighted_fitness(a);
                        let fb = fitness.weighted_fitness(b);
                        if fitness.maximize() {
                            fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
                        } else {
                            fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
                        }
                    })
                    .map(|(i, _)| i);
                if let Some(worst) = worst {
                    offspring[worst] = best.duplicate();
                }
            }
        }
        self.population = offspring;
        self.refresh_best(fitness);

        let current = self.best.as_ref().map(|b| fitness.weighted_fitness(b));
        match (previous, current) {
            (Some(prev), Some(now)) => fitness.is_better(now, prev),
            (None, Some(_)) => true,
            _ => false,
        }
    }

    /// Track the historical best across generations.
    fn refresh_best(&mut self, fitness: &FitnessConfig) {
        for individual in &self.population {
            let candidate = fitness.weighted_fitness(individual);
            let better = match &self.best {
                None => true,
                Some(best) => fitness.is_better(candidate, fitness.weighted_fitness(best)),
            };
            if better {
                self.best = Some(individual.duplicate());
            }
        }
    }

    fn snapshot(&self, fitness: &FitnessConfig, individuals_evaluated: usize) -> GenerationSnapshot {
        let finite: Vec<f64> = self
            .population
            .iter()
            .map(|i| fitness.weighted_fitness(i))
            .filter(|f| f.is_finite())
            .collect();
        let mean_fitness = if finite.is_empty() {
            fitness.worst()
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };
        GenerationSnapshot {
            generation: self.generation,
            timestamp: Utc::now(),
            best_fitness: self
                .best
                .as_ref()
                .map_or(fitness.worst(), |b| fitness.weighted_fitness(b)),
            mean_fitness,
            population_size: self.population.len(),
            individuals_evaluated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::MetricKind;
    use crate::genome::Genotype;
    use crate::random::MersenneTwister;

    /// Creator producing single-gene genomes in [0, 1).
    struct UniformCreator;
    impl Creator for UniformCreator {
        fn create(&self, count: usize, random: &dyn RandomSource) -> Vec<Individual> {
            (0..count)
                .map(|_| Individual::new(Genotype::new(vec![random.next_f64()])))
                .collect()
        }
    }

    /// Small random walk on the single gene.
    struct StepMutator;
    impl Mutator for StepMutator {
        fn mutate(&mut self, individual: &mut Individual, random: &dyn RandomSource) {
            let value = individual.genotype.gene(0) + (random.next_f64() - 0.5) * 0.1;
            individual.genotype.set_gene(0, value.clamp(0.0, 1.0));
            individual.invalidate_scores();
        }
    }

    /// Fitness is the gene value itself; counts evaluations.
    struct GeneValueEvaluator {
        fitness: FitnessConfig,
        evaluated: usize,
    }
    impl GeneValueEvaluator {
        fn new() -> Self {
            Self {
                fitness: FitnessConfig::single(MetricKind::Mcc),
                evaluated: 0,
            }
        }
    }
    impl Evaluator for GeneValueEvaluator {
        fn evaluate(&mut self, individual: &mut Individual) -> Result<()> {
            let value = individual.genotype.gene(0);
            individual.scores = Some([(MetricKind::Mcc, value)].into_iter().collect());
            self.evaluated += 1;
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

    fn strategy(population: usize, generations: usize, seed: u32) -> EvolutionStrategy {
        let mut strategy = EvolutionStrategy::new(
            population,
            Box::new(UniformCreator),
            Box::new(StepMutator),
            Box::new(BestSelector),
            Arc::new(MersenneTwister::new(seed)),
        );
        strategy.add_terminator(Box::new(GenerationCountTerminator::new(generations)));
        strategy
    }

    #[test]
    fn test_runs_exact_generation_count() {
        let mut strategy = strategy(10, 5, 0);
        let mut evaluator = GeneValueEvaluator::new();
        let outcome = strategy.run(&mut evaluator).unwrap();
        assert_eq!(outcome.generations, 5);
        assert_eq!(outcome.population.len(), 10);
        // Initial population + 5 generations of offspring.
        assert_eq!(evaluator.individuals_evaluated(), 60);
    }

    #[test]
    fn test_elitist_best_is_monotone() {
        struct BestTracker {
            values: std::sync::Arc<std::sync::Mutex<Vec<f64>>>,
        }
        impl Analyzer for BestTracker {
            fn analyze(&mut self, snapshot: &GenerationSnapshot) {
                self.values.lock().unwrap().push(snapshot.best_fitness);
            }
            fn save(&self, _path: &std::path::Path) -> Result<()> {
                Ok(())
            }
        }

        let values = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut strategy = strategy(10, 20, 7);
        strategy.add_analyzer(Box::new(BestTracker {
            values: std::sync::Arc::clone(&values),
        }));
        let mut evaluator = GeneValueEvaluator::new();
        strategy.run(&mut evaluator).unwrap();

        let values = values.lock().unwrap();
        assert_eq!(values.len(), 20);
        for pair in values.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_from_settings_assembles_and_runs() {
        use crate::cgp::GridShape;
        use crate::operators::{LookupOperatorSet, OperatorSpec};

        let set = LookupOperatorSet::new(vec![OperatorSpec::new(0, 1, vec![0.0..=1.0])]);
        let config = Arc::new(
            CgpConfig::new(
                GridShape {
                    rows: 1,
                    columns: 2,
                    levels_back: 1,
                    input_count: 1,
                    output_count: 1,
                },
                Box::new(set),
            )
            .unwrap(),
        );

        let settings = EvolutionSettings {
            population_size: 6,
            generations: 3,
            selection_method: SelectionMethod::Best,
            seed: Some(21),
            ..EvolutionSettings::default()
        };
        let mut strategy = EvolutionStrategy::from_settings(&settings, config).unwrap();
        let mut evaluator = GeneValueEvaluator::new();
        let outcome = strategy.run(&mut evaluator).unwrap();
        assert_eq!(outcome.generations, 3);
        assert_eq!(outcome.population.len(), 6);
    }

    #[test]
    fn test_from_settings_rejects_invalid() {
        use crate::cgp::GridShape;
        use crate::operators::{LookupOperatorSet, OperatorSpec};

        let set = LookupOperatorSet::new(vec![OperatorSpec::new(0, 1, vec![])]);
        let config = Arc::new(
            CgpConfig::new(
                GridShape {
                    rows: 1,
                    columns: 1,
                    levels_back: 1,
                    input_count: 1,
                    output_count: 1,
                },
                Box::new(set),
            )
            .unwrap(),
        );

        let settings = EvolutionSettings {
            population_size: 0,
            ..EvolutionSettings::default()
        };
        assert!(EvolutionStrategy::from_settings(&settings, config).is_err());
    }

    #[test]
    fn test_requires_terminator() {
        let mut strategy = EvolutionStrategy::new(
            4,
            Box::new(UniformCreator),
            Box::new(StepMutator),
            Box::new(BestSelector),
            Arc::new(MersenneTwister::new(1)),
        );
        let mut evaluator = GeneValueEvaluator::new();
        assert!(strategy.run(&mut evaluator).is_err());
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let mut evaluator_a = GeneValueEvaluator::new();
        let mut evaluator_b = GeneValueEvaluator::new();
        let outcome_a = strategy(8, 10, 42).run(&mut evaluator_a).unwrap();
        let outcome_b = strategy(8, 10, 42).run(&mut evaluator_b).unwrap();
        assert_eq!(outcome_a.best.genotype, outcome_b.best.genotype);
    }
}
