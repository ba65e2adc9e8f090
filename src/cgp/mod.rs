pub mod config;
pub mod decoder;

pub use config::{CgpConfig, GridShape};
pub use decoder::{decode, Phenotype};
