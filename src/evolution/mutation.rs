use crate::cgp::CgpConfig;
use crate::genome::{BooleanGenotype, Individual};
use crate::random::RandomSource;
use std::sync::Arc;

/// Mutates one individual in place. `observe_generation` lets adaptive
/// policies react to whether the last generation improved the best fitness.
pub trait Mutator: Send {
    fn mutate(&mut self, individual: &mut Individual, random: &dyn RandomSource);

    fn observe_generation(&mut self, improved: bool) {
        let _ = improved;
    }
}

/// Redraw the operator gene of a node and repair its parameters to the new
/// operator's bounds.
fn redraw_operator(
    config: &CgpConfig,
    individual: &mut Individual,
    column: usize,
    offset: usize,
    random: &dyn RandomSource,
) {
    let operators = config.valid_operators(column);
    let operator = operators[random.next_below(operators.len() as i64) as usize];
    individual.genotype.set_gene(offset, operator as f64);

    let bounds = config.operators().parameter_bounds(operator).to_vec();
    for k in 0..config.parameter_count() {
        let slot = offset + 1 + config.max_arity() + k;
        let value = individual.genotype.gene(slot);
        if let Some(range) = bounds.get(k) {
            if !range.contains(&value) {
                individual
                    .genotype
                    .set_gene(slot, range.start() + random.next_f64() * (range.end() - range.start()));
            }
        }
    }
}

fn redraw_connection(
    config: &CgpConfig,
    individual: &mut Individual,
    column: usize,
    slot: usize,
    random: &dyn RandomSource,
) {
    let sources = config.connection_sources(column);
    let source = sources[random.next_below(sources.len() as i64) as usize];
    individual.genotype.set_gene(slot, source as f64);
}

fn redraw_output(
    config: &CgpConfig,
    individual: &mut Individual,
    slot: usize,
    random: &dyn RandomSource,
) {
    let node = random.next_below(config.node_count() as i64) as usize;
    individual.genotype.set_gene(slot, node as f64);
}

/// Per-gene point mutation: every gene is redrawn in its legal domain with
/// probability `gene_rate`.
pub struct PointMutator {
    config: Arc<CgpConfig>,
    pub gene_rate: f64,
}

impl PointMutator {
    pub fn new(config: Arc<CgpConfig>, gene_rate: f64) -> Self {
        Self { config, gene_rate }
    }
}

impl Mutator for PointMutator {
    fn mutate(&mut self, individual: &mut Individual, random: &dyn RandomSource) {
        let config = &self.config;
        let shape = *config.shape();

        for column in 0..shape.columns {
            for row in 0..shape.rows {
                let node = config.node_id(column, row);
                let offset = config.node_gene_offset(node);

                if random.next_f64() < self.gene_rate {
                    redraw_operator(config, individual, column, offset, random);
                }
                for k in 0..config.max_arity() {
                    if random.next_f64() < self.gene_rate {
                        redraw_connection(config, individual, column, offset + 1 + k, random);
                    }
                }
                for k in 0..config.parameter_count() {
                    if random.next_f64() < self.gene_rate {
                        let operator = individual.genotype.gene(offset) as usize;
                        let bounds = config.operators().parameter_bounds(operator);
                        if let Some(range) = bounds.get(k) {
                            let slot = offset + 1 + config.max_arity() + k;
                            individual.genotype.set_gene(
                                slot,
                                range.start() + random.next_f64() * (range.end() - range.start()),
                            );
                        }
                    }
                }
            }
        }

        let output_offset = config.output_gene_offset();
        for i in 0..shape.output_count {
            if random.next_f64() < self.gene_rate {
                redraw_output(config, individual, output_offset + i, random);
            }
        }
        individual.invalidate_scores();
    }
}

/// Gaussian parameter mutation with a sawtooth sigma schedule.
///
/// Structure genes (operators, connections, outputs) are point-redrawn with
/// `gene_rate`; parameter genes are perturbed with `N(0, sigma)` and clamped
/// to their bounds. Each generation without improvement widens sigma by
/// `step`; an improvement resets it to `base`; crossing `max` also resets to
/// `base`, restarting the widening ramp.
pub struct AdaptiveGaussianMutator {
    config: Arc<CgpConfig>,
    pub gene_rate: f64,
    base_sigma: f64,
    step: f64,
    max_sigma: f64,
    sigma: f64,
}

impl AdaptiveGaussianMutator {
    pub fn new(
        config: Arc<CgpConfig>,
        gene_rate: f64,
        base_sigma: f64,
        step: f64,
        max_sigma: f64,
    ) -> Self {
        Self {
            config,
            gene_rate,
            base_sigma,
            step,
            max_sigma,
            sigma: base_sigma,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Mutator for AdaptiveGaussianMutator {
    fn mutate(&mut self, individual: &mut Individual, random: &dyn RandomSource) {
        let config = &self.config;
        let shape = *config.shape();

        for column in 0..shape.columns {
            for row in 0..shape.rows {
                let node = config.node_id(column, row);
                let offset = config.node_gene_offset(node);

                if random.next_f64() < self.gene_rate {
                    redraw_operator(config, individual, column, offset, random);
                }
                for k in 0..config.max_arity() {
                    if random.next_f64() < self.gene_rate {
                        redraw_connection(config, individual, column, offset + 1 + k, random);
                    }
                }

                let operator = individual.genotype.gene(offset) as usize;
                let bounds = config.operators().parameter_bounds(operator).to_vec();
                for (k, range) in bounds.iter().enumerate() {
                    if random.next_f64() < self.gene_rate {
                        let slot = offset + 1 + config.max_arity() + k;
                        let perturbed = individual.genotype.gene(slot)
                            + random.next_gaussian(0.0, self.sigma);
                        individual
                            .genotype
                            .set_gene(slot, perturbed.clamp(*range.start(), *range.end()));
                    }
                }
            }
        }

        let output_offset = config.output_gene_offset();
        for i in 0..shape.output_count {
            if random.next_f64() < self.gene_rate {
                redraw_output(config, individual, output_offset + i, random);
            }
        }
        individual.invalidate_scores();
    }

    fn observe_generation(&mut self, improved: bool) {
        if improved {
            self.sigma = self.base_sigma;
        } else {
            self.sigma += self.step;
            if self.sigma > self.max_sigma {
                self.sigma = self.base_sigma;
            }
        }
    }
}

/// Bit-flip mutation for boolean genomes, honoring the max-true cap.
pub struct BooleanFlipMutator {
    pub flip_rate: f64,
}

impl BooleanFlipMutator {
    pub fn new(flip_rate: f64) -> Self {
        Self { flip_rate }
    }

    pub fn mutate(&self, genome: &mut BooleanGenotype, random: &dyn RandomSource) {
        genome.mutate(self.flip_rate, random);
    }
}
