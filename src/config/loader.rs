use super::traits::ConfigSection;
use crate::error::{EvoVisionError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    pub batch_size: usize,
    /// Bounded buffer depth for the streaming producer.
    pub queue_capacity: usize,
    /// Force the streaming path even for resident datasets.
    pub streaming: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_size: 32,
            queue_capacity: 2,
            streaming: false,
        }
    }
}

impl ConfigSection for LoaderSettings {
    fn section_name() -> &'static str {
        "loader"
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EvoVisionError::Configuration(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(EvoVisionError::Configuration(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
