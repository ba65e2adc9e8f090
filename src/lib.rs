//! Cartesian genetic programming for image-analysis pipelines.
//!
//! A genome is a flat float vector decoded against a [`cgp::CgpConfig`] into
//! an acyclic program graph. Populations of such programs are evolved by an
//! [`evolution::EvolutionStrategy`], scored against a dataset through the
//! [`evaluation::BatchEvaluator`], and ranked by confusion-matrix metrics
//! from [`fitness`].

pub mod cgp;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod evolution;
pub mod fitness;
pub mod genome;
pub mod operators;
pub mod random;
pub mod types;

pub use error::{EvoVisionError, Result};
