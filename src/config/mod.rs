pub mod evolution;
pub mod fitness;
pub mod loader;
pub mod manager;
pub mod traits;

pub use evolution::{EvolutionSettings, SelectionMethod};
pub use fitness::FitnessSettings;
pub use loader::LoaderSettings;
pub use manager::{AppConfig, ConfigManager};
pub use traits::ConfigSection;
