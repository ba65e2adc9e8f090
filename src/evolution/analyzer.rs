use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Immutable summary of one completed generation, handed to analyzers.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSnapshot {
    pub generation: usize,
    pub timestamp: DateTime<Utc>,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub population_size: usize,
    pub individuals_evaluated: usize,
}

/// Observes the run at generation boundaries. Analyzers receive an explicit
/// snapshot and can never mutate strategy state.
pub trait Analyzer: Send {
    fn analyze(&mut self, snapshot: &GenerationSnapshot);

    /// Persist whatever the analyzer collected.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Invokes a list of analyzers in registration order.
pub struct CompositeAnalyzer {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl CompositeAnalyzer {
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self { analyzers }
    }
}

impl Analyzer for CompositeAnalyzer {
    fn analyze(&mut self, snapshot: &GenerationSnapshot) {
        for analyzer in &mut self.analyzers {
            analyzer.analyze(snapshot);
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        for analyzer in &self.analyzers {
            analyzer.save(path)?;
        }
        Ok(())
    }
}

/// Logs per-generation progress.
pub struct LogAnalyzer;

impl Analyzer for LogAnalyzer {
    fn analyze(&mut self, snapshot: &GenerationSnapshot) {
        log::info!(
            "generation {}: best={:.4} mean={:.4} evaluated={}",
            snapshot.generation,
            snapshot.best_fitness,
            snapshot.mean_fitness,
            snapshot.individuals_evaluated
        );
    }

    fn save(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Records every snapshot and saves the run history as JSON.
#[derive(Default)]
pub struct HistoryAnalyzer {
    history: Vec<GenerationSnapshot>,
}

impl HistoryAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[GenerationSnapshot] {
        &self.history
    }
}

impl Analyzer for HistoryAnalyzer {
    fn analyze(&mut self, snapshot: &GenerationSnapshot) {
        self.history.push(snapshot.clone());
    }

    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(generation: usize, best: f64) -> GenerationSnapshot {
        GenerationSnapshot {
            generation,
            timestamp: Utc::now(),
            best_fitness: best,
            mean_fitness: best / 2.0,
            population_size: 10,
            individuals_evaluated: (generation + 1) * 10,
        }
    }

    #[test]
    fn test_history_records_in_order() {
        let mut analyzer = HistoryAnalyzer::new();
        analyzer.analyze(&snapshot(0, 0.1));
        analyzer.analyze(&snapshot(1, 0.2));
        assert_eq!(analyzer.history().len(), 2);
        assert_eq!(analyzer.history()[1].generation, 1);
    }

    #[test]
    fn test_composite_invokes_in_registration_order() {
        struct Tagger {
            tag: usize,
            log: std::sync::Arc<std::sync::Mutex<Vec<usize>>>,
        }
        impl Analyzer for Tagger {
            fn analyze(&mut self, _snapshot: &GenerationSnapshot) {
                self.log.lock().unwrap().push(self.tag);
            }
            fn save(&self, _path: &Path) -> Result<()> {
                Ok(())
            }
        }

        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut composite = CompositeAnalyzer::new(vec![
            Box::new(Tagger {
                tag: 1,
                log: std::sync::Arc::clone(&log),
            }),
            Box::new(Tagger {
                tag: 2,
                log: std::sync::Arc::clone(&log),
            }),
        ]);
        composite.analyze(&snapshot(0, 0.0));
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }
}
