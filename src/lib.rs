//! segment-classifiers: survey segment classification with a small neural
//! network.
//!
//! The crate covers the whole modelling workflow for a labelled survey:
//! reading and projecting the raw file, a stratified train/test split, a
//! feature recipe fitted on training rows only, a single-hidden-layer
//! classifier behind a uniform fit/predict trait, cross-validated grid
//! search over its hyperparameters, and accuracy on held-out data.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod math;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod splitting;
pub mod stats;
pub mod tuning;
pub mod workflow;

pub use error::{PipelineError, Result};
