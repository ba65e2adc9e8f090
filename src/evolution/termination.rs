use crate::genome::Individual;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Read-only view of the strategy handed to terminators at generation
/// boundaries.
#[derive(Debug)]
pub struct StrategyState<'a> {
    pub generation: usize,
    pub best: Option<&'a Individual>,
    /// Weighted fitness of `best`, or the sentinel worst when unevaluated.
    pub best_fitness: f64,
    pub population: &'a [Individual],
}

/// Stopping-condition predicate, checked once per generation. Cancellation
/// is cooperative: an in-flight evaluation is never preempted.
pub trait Terminator: Send {
    fn terminate(&mut self, state: &StrategyState<'_>) -> bool;
}

/// Stops after a fixed number of generations.
pub struct GenerationCountTerminator {
    pub limit: usize,
}

impl GenerationCountTerminator {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Terminator for GenerationCountTerminator {
    fn terminate(&mut self, state: &StrategyState<'_>) -> bool {
        state.generation >= self.limit
    }
}

/// Cooperative cancellation flag, shareable across threads. Decoupled from
/// any execution host; whoever owns a clone can cancel the run.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Stops when the token has been cancelled.
pub struct CancellationTerminator {
    token: CancellationToken,
}

impl CancellationTerminator {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Terminator for CancellationTerminator {
    fn terminate(&mut self, _state: &StrategyState<'_>) -> bool {
        self.token.is_cancelled()
    }
}

/// Stops after `patience` consecutive generations without best-fitness
/// improvement.
pub struct FitnessPlateauTerminator {
    patience: usize,
    maximize: bool,
    best_seen: Option<f64>,
    stagnant: usize,
}

impl FitnessPlateauTerminator {
    pub fn new(patience: usize, maximize: bool) -> Self {
        Self {
            patience,
            maximize,
            best_seen: None,
            stagnant: 0,
        }
    }
}

impl Terminator for FitnessPlateauTerminator {
    fn terminate(&mut self, state: &StrategyState<'_>) -> bool {
        let current = state.best_fitness;
        let improved = match self.best_seen {
            None => true,
            Some(best) => {
                if self.maximize {
                    current > best
                } else {
                    current < best
                }
            }
        };
        if improved {
            self.best_seen = Some(current);
            self.stagnant = 0;
        } else {
            self.stagnant += 1;
        }
        self.stagnant >= self.patience
    }
}

/// Logical OR over independent stopping conditions. Every member is
/// consulted each generation so stateful terminators keep their counters
/// current even when another member already fired.
pub struct CompositeTerminator {
    terminators: Vec<Box<dyn Terminator>>,
}

impl CompositeTerminator {
    pub fn new(terminators: Vec<Box<dyn Terminator>>) -> Self {
        Self { terminators }
    }
}

impl Terminator for CompositeTerminator {
    fn terminate(&mut self, state: &StrategyState<'_>) -> bool {
        let mut stop = false;
        for terminator in &mut self.terminators {
            if terminator.terminate(state) {
                stop = true;
            }
        }
        stop
    }
}
