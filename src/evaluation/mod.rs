pub mod evaluator;

pub use evaluator::{
    BatchEvaluator, BatchStats, EvaluationObserver, Evaluator, ProgramExecutor,
};
