pub mod analyzer;
pub mod creator;
pub mod mutation;
pub mod recombination;
pub mod selection;
pub mod strategy;
pub mod termination;

pub use analyzer::{Analyzer, CompositeAnalyzer, GenerationSnapshot, HistoryAnalyzer, LogAnalyzer};
pub use creator::{CgpCreator, Creator};
pub use mutation::{AdaptiveGaussianMutator, BooleanFlipMutator, Mutator, PointMutator};
pub use recombination::{Recombinator, SinglePointRecombinator};
pub use selection::{
    BestSelector, RandomSelector, RouletteWheelSelector, Selector, TournamentSelector,
};
pub use strategy::{EvolutionOutcome, EvolutionStrategy, MergePolicy};
pub use termination::{
    CancellationTerminator, CancellationToken, CompositeTerminator, FitnessPlateauTerminator,
    GenerationCountTerminator, StrategyState, Terminator,
};
