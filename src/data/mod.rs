pub mod dataset;
pub mod loader;

pub use dataset::{Dataset, InMemoryDataset};
pub use loader::{Batch, DataLoader, Epoch};
