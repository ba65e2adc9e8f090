use super::{
    evolution::EvolutionSettings, fitness::FitnessSettings, loader::LoaderSettings,
    traits::ConfigSection,
};
use crate::error::{EvoVisionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub evolution: EvolutionSettings,
    #[serde(default)]
    pub loader: LoaderSettings,
    #[serde(default)]
    pub fitness: FitnessSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        validate_section(&self.evolution)?;
        validate_section(&self.loader)?;
        validate_section(&self.fitness)?;
        Ok(())
    }
}

/// Prefix a section's validation failure with its name, so a bad value in a
/// multi-section file is attributable.
fn validate_section<S: ConfigSection>(section: &S) -> Result<()> {
    section
        .validate()
        .map_err(|e| EvoVisionError::Configuration(format!("[{}] {}", S::section_name(), e)))
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EvoVisionError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| EvoVisionError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.config.write().unwrap() = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = self.config.read().unwrap();
        let toml_str = toml::to_string_pretty(&*config)
            .map_err(|e| EvoVisionError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| EvoVisionError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap();
        f(&mut config);
        config.validate()?;
        Ok(())
    }
}
