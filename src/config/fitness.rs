use super::traits::ConfigSection;
use crate::error::{EvoVisionError, Result};
use crate::fitness::{FitnessConfig, FitnessThresholds, MetricKind};
use serde::{Deserialize, Serialize};

/// Serializable counterpart of [`FitnessConfig`]; metric names are kept as
/// strings so a config file stays readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessSettings {
    pub metrics: Vec<String>,
    pub weights: Vec<f64>,
    pub maximize: bool,
    pub beta_squared: f64,
    #[serde(default)]
    pub thresholds: FitnessThresholds,
}

impl Default for FitnessSettings {
    fn default() -> Self {
        Self {
            metrics: vec!["mcc".to_string()],
            weights: vec![1.0],
            maximize: true,
            beta_squared: 1.0,
            thresholds: FitnessThresholds::default(),
        }
    }
}

impl FitnessSettings {
    pub fn to_fitness_config(&self) -> Result<FitnessConfig> {
        let metrics = self
            .metrics
            .iter()
            .map(|name| name.parse::<MetricKind>())
            .collect::<Result<Vec<_>>>()?;
        Ok(
            FitnessConfig::new(metrics, self.weights.clone(), self.maximize)?
                .with_beta_squared(self.beta_squared)
                .with_thresholds(self.thresholds.clone()),
        )
    }
}

impl ConfigSection for FitnessSettings {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<()> {
        if self.beta_squared <= 0.0 {
            return Err(EvoVisionError::Configuration(
                "beta squared must be positive".to_string(),
            ));
        }
        self.to_fitness_config().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_produce_config() {
        let settings = FitnessSettings::default();
        let config = settings.to_fitness_config().unwrap();
        assert_eq!(config.metrics(), &[MetricKind::Mcc]);
        assert!(config.maximize());
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let mut settings = FitnessSettings::default();
        settings.metrics = vec!["sharpe".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut settings = FitnessSettings::default();
        settings.metrics = vec!["precision".to_string(), "recall".to_string()];
        settings.weights = vec![1.0];
        assert!(settings.validate().is_err());
    }
}
