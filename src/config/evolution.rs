use super::traits::ConfigSection;
use crate::error::{EvoVisionError, Result};
use crate::evolution::MergePolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSettings {
    pub population_size: usize,
    pub generations: usize,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub selection_method: SelectionMethod,
    pub tournament_size: usize,
    pub tournament_probability: f64,
    pub merge_policy: MergePolicy,
    /// Gaussian parameter-mutation schedule.
    pub base_sigma: f64,
    pub sigma_step: f64,
    pub max_sigma: f64,
    /// Fixed seed for reproducible runs; None draws from entropy.
    pub seed: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    Best,
    Random,
    Roulette,
    Tournament,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.05,
            crossover_rate: 0.5,
            selection_method: SelectionMethod::Tournament,
            tournament_size: 4,
            tournament_probability: 0.8,
            merge_policy: MergePolicy::Elitist,
            base_sigma: 0.1,
            sigma_step: 0.05,
            max_sigma: 1.0,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionSettings {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(EvoVisionError::Configuration(
                "population size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvoVisionError::Configuration(
                "mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EvoVisionError::Configuration(
                "crossover rate must be between 0 and 1".to_string(),
            ));
        }
        if self.selection_method == SelectionMethod::Tournament {
            if self.tournament_size == 0 {
                return Err(EvoVisionError::Configuration(
                    "tournament size must be at least 1".to_string(),
                ));
            }
            if !(0.0..=1.0).contains(&self.tournament_probability) {
                return Err(EvoVisionError::Configuration(
                    "tournament probability must be between 0 and 1".to_string(),
                ));
            }
        }
        if self.base_sigma <= 0.0 || self.sigma_step < 0.0 || self.max_sigma < self.base_sigma {
            return Err(EvoVisionError::Configuration(
                "sigma schedule requires base > 0, step >= 0, max >= base".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EvolutionSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_rates() {
        let mut settings = EvolutionSettings::default();
        settings.mutation_rate = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = EvolutionSettings::default();
        settings.crossover_rate = -0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_population() {
        let mut settings = EvolutionSettings::default();
        settings.population_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_tournament_fields_only_checked_for_tournament() {
        let mut settings = EvolutionSettings::default();
        settings.tournament_size = 0;
        assert!(settings.validate().is_err());
        settings.selection_method = SelectionMethod::Best;
        assert!(settings.validate().is_ok());
    }
}
