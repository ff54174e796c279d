//! Factorization Machine trainer
//!
//! Trains a Factorization Machine (FM) on tabular CSV data with candle's
//! autodiff and optimizers, and optionally dumps the learned per-feature
//! latent vectors.
//!
//! # Architecture
//!
//! - **data**: CSV loading and cyclic fixed-size mini-batches
//! - **layers**: the pairwise interaction term
//! - **models**: the `FactorModel` capability and the candle FM
//! - **training**: epoch bookkeeping, held-out evaluation, factor export
//!
//! # Example
//!
//! ```ignore
//! use fm_trainer::{TrainConfig, FactorizationMachine, training};
//!
//! let config = TrainConfig {
//!     train_path: Some("data/train.csv".into()),
//!     ..Default::default()
//! };
//! let summary = training::run::<FactorizationMachine>(config, &candle_core::Device::Cpu)?;
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod layers;
pub mod models;
pub mod training;

// Re-export commonly used items
pub use config::{LossKind, ModelConfig, OptimizerKind, TrainConfig};
pub use data::{Batch, DataSource};
pub use models::{FactorModel, FactorizationMachine};
pub use training::{Trainer, TrainingSummary};

use std::path::PathBuf;

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum FmError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Failed to load {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FmError>;
