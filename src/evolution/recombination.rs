use crate::genome::Individual;
use crate::random::RandomSource;

/// Produces two children from two parents.
pub trait Recombinator: Send {
    fn recombine(
        &self,
        first: &Individual,
        second: &Individual,
        random: &dyn RandomSource,
    ) -> (Individual, Individual);
}

/// Single-point crossover: swap genome tails at a random cut.
///
/// CGP genomes are positional, so exchanging whole positions between two
/// valid parents always yields valid children.
pub struct SinglePointRecombinator;

impl Recombinator for SinglePointRecombinator {
    fn recombine(
        &self,
        first: &Individual,
        second: &Individual,
        random: &dyn RandomSource,
    ) -> (Individual, Individual) {
        let len = first.genotype.len().min(second.genotype.len());
        let mut a = first.duplicate();
        let mut b = second.duplicate();
        a.invalidate_scores();
        b.invalidate_scores();

        if len > 1 {
            let point = random.next_range(1, len as i64) as usize;
            for i in point..len {
                let tmp = a.genotype.gene(i);
                a.genotype.set_gene(i, b.genotype.gene(i));
                b.genotype.set_gene(i, tmp);
            }
        }
        (a, b)
    }
}
