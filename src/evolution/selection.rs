use crate::fitness::FitnessConfig;
use crate::genome::Individual;
use crate::random::RandomSource;

/// Picks `count` individuals from a population. Returned individuals are
/// deep copies; the source population is never aliased into the next
/// generation.
pub trait Selector: Send {
    fn select(
        &self,
        individuals: &[Individual],
        count: usize,
        fitness: &FitnessConfig,
        random: &dyn RandomSource,
    ) -> Vec<Individual>;
}

/// Population indices ordered best-first for the configured direction.
fn ranked_indices(individuals: &[Individual], fitness: &FitnessConfig) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..individuals.len()).collect();
    indices.sort_by(|&a, &b| {
        let fa = fitness.weighted_fitness(&individuals[a]);
        let fb = fitness.weighted_fitness(&individuals[b]);
        if fitness.maximize() {
            fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
    indices
}

/// Top `count` by weighted fitness, wrapping around when `count` exceeds
/// the population size.
pub struct BestSelector;

impl Selector for BestSelector {
    fn select(
        &self,
        individuals: &[Individual],
        count: usize,
        fitness: &FitnessConfig,
        random: &dyn RandomSource,
    ) -> Vec<Individual> {
        let _ = random;
        assert!(!individuals.is_empty(), "cannot select from an empty population");
        let ranked = ranked_indices(individuals, fitness);
        (0..count)
            .map(|i| individuals[ranked[i % ranked.len()]].duplicate())
            .collect()
    }
}

/// Uniform draw with replacement.
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn select(
        &self,
        individuals: &[Individual],
        count: usize,
        _fitness: &FitnessConfig,
        random: &dyn RandomSource,
    ) -> Vec<Individual> {
        assert!(!individuals.is_empty(), "cannot select from an empty population");
        (0..count)
            .map(|_| individuals[random.next_below(individuals.len() as i64) as usize].duplicate())
            .collect()
    }
}

/// Fitness-proportional selection.
///
/// For minimization each fitness is transformed to `1 - weighted` before the
/// wheel is built. A non-positive wheel sum breaks the proportional-interval
/// construction (with a zero sum no partial sum ever exceeds the target, so
/// every draw would land on the last slot), so selection degrades to a
/// uniform draw in that case.
pub struct RouletteWheelSelector;

impl RouletteWheelSelector {
    fn wheel_value(individual: &Individual, fitness: &FitnessConfig) -> f64 {
        let weighted = fitness.weighted_fitness(individual);
        if fitness.maximize() {
            weighted
        } else {
            1.0 - weighted
        }
    }
}

impl Selector for RouletteWheelSelector {
    fn select(
        &self,
        individuals: &[Individual],
        count: usize,
        fitness: &FitnessConfig,
        random: &dyn RandomSource,
    ) -> Vec<Individual> {
        assert!(!individuals.is_empty(), "cannot select from an empty population");
        let values: Vec<f64> = individuals
            .iter()
            .map(|i| Self::wheel_value(i, fitness))
            .collect();
        let sum: f64 = values.iter().sum();

        if sum <= 0.0 || !sum.is_finite() {
            return RandomSelector.select(individuals, count, fitness, random);
        }

        (0..count)
            .map(|_| {
                let target = random.next_f64() * sum;
                let mut accumulated = 0.0;
                for (index, value) in values.iter().enumerate() {
                    accumulated += value;
                    if accumulated > target {
                        return individuals[index].duplicate();
                    }
                }
                // Rounding left the target unreached; take the last slot.
                individuals[individuals.len() - 1].duplicate()
            })
            .collect()
    }
}

/// Tournament selection with geometric acceptance.
///
/// `size` contestants are drawn with replacement and ranked; the best is
/// accepted with probability `probability`, the second-best with
/// `probability * (1 - probability)`, and so on. If no contestant is
/// accepted before the tournament is exhausted, the last-considered
/// contestant is force-accepted. That fallback means the distribution over
/// a finite tournament is not properly normalized; the behavior is kept
/// as-is because changing it changes search dynamics.
pub struct TournamentSelector {
    pub size: usize,
    pub probability: f64,
}

impl TournamentSelector {
    pub fn new(size: usize, probability: f64) -> Self {
        Self { size, probability }
    }
}

impl Selector for TournamentSelector {
    fn select(
        &self,
        individuals: &[Individual],
        count: usize,
        fitness: &FitnessConfig,
        random: &dyn RandomSource,
    ) -> Vec<Individual> {
        assert!(!individuals.is_empty(), "cannot select from an empty population");
        assert!(self.size > 0, "tournament size must be at least 1");

        (0..count)
            .map(|_| {
                let mut contestants: Vec<usize> = (0..self.size)
                    .map(|_| random.next_below(individuals.len() as i64) as usize)
                    .collect();
                contestants.sort_by(|&a, &b| {
                    let fa = fitness.weighted_fitness(&individuals[a]);
                    let fb = fitness.weighted_fitness(&individuals[b]);
                    if fitness.maximize() {
                        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
                    } else {
                        fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
                    }
                });

                let mut chosen = contestants[contestants.len() - 1];
                for &contestant in &contestants {
                    if random.next_f64() < self.probability {
                        chosen = contestant;
                        break;
                    }
                }
                individuals[chosen].duplicate()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::MetricKind;
    use crate::genome::Genotype;
    use crate::random::MersenneTwister;

    fn population(fitnesses: &[f64]) -> Vec<Individual> {
        fitnesses
            .iter()
            .map(|&f| {
                let mut individual = Individual::new(Genotype::zeroed(1));
                individual.scores = Some([(MetricKind::Mcc, f)].into_iter().collect());
                individual
            })
            .collect()
    }

    fn config() -> FitnessConfig {
        FitnessConfig::single(MetricKind::Mcc)
    }

    #[test]
    fn test_best_selector_orders_non_increasing() {
        let population = population(&[0.3, 0.9, 0.1, 0.7, 0.5]);
        let fitness = config();
        let rng = MersenneTwister::new(0);
        // More draws than individuals: wraparound restarts from the top.
        let selected = BestSelector.select(&population, 12, &fitness, &rng);
        assert_eq!(selected.len(), 12);
        for window in selected.chunks(5) {
            for pair in window.windows(2) {
                let a = fitness.weighted_fitness(&pair[0]);
                let b = fitness.weighted_fitness(&pair[1]);
                assert!(a >= b);
            }
        }
        assert!((fitness.weighted_fitness(&selected[0]) - 0.9).abs() < 1e-12);
        assert!((fitness.weighted_fitness(&selected[5]) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_best_selector_minimizing() {
        let population = population(&[0.3, 0.9, 0.1]);
        let fitness = FitnessConfig::new(vec![MetricKind::Mcc], vec![1.0], false).unwrap();
        let rng = MersenneTwister::new(0);
        let selected = BestSelector.select(&population, 1, &fitness, &rng);
        assert!((fitness.weighted_fitness(&selected[0]) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_selection_returns_copies() {
        let population = population(&[0.5, 0.6]);
        let rng = MersenneTwister::new(2);
        let selected = RandomSelector.select(&population, 4, &config(), &rng);
        for s in &selected {
            assert!(population.iter().all(|p| p.id() != s.id()));
        }
    }

    #[test]
    fn test_roulette_prefers_fitter() {
        let population = population(&[0.05, 0.95]);
        let fitness = config();
        let rng = MersenneTwister::new(4);
        let selected = RouletteWheelSelector.select(&population, 2000, &fitness, &rng);
        let fit_picks = selected
            .iter()
            .filter(|s| fitness.weighted_fitness(s) > 0.5)
            .count();
        // Expected ~95%; far from uniform.
        assert!(fit_picks > 1600);
    }

    #[test]
    fn test_roulette_negative_sum_degrades_to_uniform() {
        let population = population(&[-0.9, -0.8, -0.7]);
        let fitness = config();
        let rng = MersenneTwister::new(6);
        let selected = RouletteWheelSelector.select(&population, 300, &fitness, &rng);
        assert_eq!(selected.len(), 300);
        // All three must appear; a proportional wheel cannot be built.
        for &f in &[-0.9, -0.8, -0.7] {
            assert!(selected
                .iter()
                .any(|s| (fitness.weighted_fitness(s) - f).abs() < 1e-12));
        }
    }

    #[test]
    fn test_roulette_zero_sum_degrades_to_uniform() {
        // All weighted fitnesses exactly 0: the wheel sum is 0, no partial
        // sum can exceed the target, so without the fallback every draw
        // would land on the last individual.
        let population: Vec<Individual> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&g| {
                let mut individual = Individual::new(Genotype::new(vec![g]));
                individual.scores = Some([(MetricKind::Mcc, 0.0)].into_iter().collect());
                individual
            })
            .collect();
        let fitness = config();
        let rng = MersenneTwister::new(14);
        let selected = RouletteWheelSelector.select(&population, 300, &fitness, &rng);
        for parent in &population {
            assert!(selected.iter().any(|s| s.genotype == parent.genotype));
        }
    }

    #[test]
    fn test_roulette_minimizing_transform() {
        let population = population(&[0.1, 0.9]);
        let fitness = FitnessConfig::new(vec![MetricKind::Mcc], vec![1.0], false).unwrap();
        let rng = MersenneTwister::new(8);
        let selected = RouletteWheelSelector.select(&population, 2000, &fitness, &rng);
        let low_picks = selected
            .iter()
            .filter(|s| fitness.weighted_fitness(s) < 0.5)
            .count();
        // Wheel values 0.9 vs 0.1: the minimizer favors the low fitness.
        assert!(low_picks > 1600);
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let population = population(&[0.1, 0.2, 0.3, 0.4, 0.9]);
        let fitness = config();
        let rng = MersenneTwister::new(10);
        let selector = TournamentSelector::new(3, 0.9);
        let selected = selector.select(&population, 1000, &fitness, &rng);
        let best_picks = selected
            .iter()
            .filter(|s| fitness.weighted_fitness(s) > 0.8)
            .count();
        // The best individual enters ~half the tournaments and nearly always
        // wins the ones it enters.
        assert!(best_picks > 350);
    }

    #[test]
    fn test_tournament_zero_probability_forces_last() {
        let population = population(&[0.1, 0.9]);
        let fitness = config();
        let rng = MersenneTwister::new(12);
        // No contestant is ever accepted, so the worst-ranked contestant of
        // each tournament is force-accepted.
        let selector = TournamentSelector::new(2, 0.0);
        let selected = selector.select(&population, 100, &fitness, &rng);
        assert_eq!(selected.len(), 100);
    }
}
