use crate::cgp::CgpConfig;
use crate::genome::{Genotype, Individual};
use crate::random::RandomSource;
use std::sync::Arc;

/// Produces the initial population.
pub trait Creator: Send {
    fn create(&self, count: usize, random: &dyn RandomSource) -> Vec<Individual>;
}

/// Creates random genomes that are valid by construction: operator genes
/// drawn from the column's valid set, connection genes from inside the
/// levels-back window, parameter genes within their operator's bounds.
pub struct CgpCreator {
    config: Arc<CgpConfig>,
}

impl CgpCreator {
    pub fn new(config: Arc<CgpConfig>) -> Self {
        Self { config }
    }

    fn random_genotype(&self, random: &dyn RandomSource) -> Genotype {
        let config = &self.config;
        let shape = config.shape();
        let mut genotype = Genotype::zeroed(config.genome_length());

        for column in 0..shape.columns {
            let operators = config.valid_operators(column);
            let sources = config.connection_sources(column);
            for row in 0..shape.rows {
                let node = config.node_id(column, row);
                let offset = config.node_gene_offset(node);

                let operator =
                    operators[random.next_below(operators.len() as i64) as usize];
                genotype.set_gene(offset, operator as f64);

                for k in 0..config.max_arity() {
                    let source = sources[random.next_below(sources.len() as i64) as usize];
                    genotype.set_gene(offset + 1 + k, source as f64);
                }

                let bounds = config.operators().parameter_bounds(operator);
                for k in 0..config.parameter_count() {
                    let value = match bounds.get(k) {
                        Some(range) => {
                            range.start() + random.next_f64() * (range.end() - range.start())
                        }
                        None => 0.0,
                    };
                    genotype.set_gene(offset + 1 + config.max_arity() + k, value);
                }
            }
        }

        let output_offset = config.output_gene_offset();
        for i in 0..shape.output_count {
            let node = random.next_below(config.node_count() as i64) as usize;
            genotype.set_gene(output_offset + i, node as f64);
        }
        genotype
    }
}

impl Creator for CgpCreator {
    fn create(&self, count: usize, random: &dyn RandomSource) -> Vec<Individual> {
        (0..count)
            .map(|_| Individual::new(self.random_genotype(random)))
            .collect()
    }
}
