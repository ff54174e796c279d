/// Configuration for Factorization Machine training
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Loss minimized by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// Mean squared error (regression)
    SquaredError,
    /// Sigmoid cross-entropy on logits (binary classification)
    CrossEntropy,
}

/// Optimizer driving the parameter updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// candle-nn AdamW without weight decay
    #[default]
    Adam,
    /// candle-nn plain SGD
    Sgd,
}

/// Full configuration of a training run.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Rows per mini-batch
    pub batch_size: usize,

    /// Passes over the full training set
    pub epochs: usize,

    /// Optimizer learning rate
    pub learning_rate: f64,

    /// Dimension of the per-feature latent vectors
    pub factor_dim: usize,

    /// Use sigmoid cross-entropy instead of squared error
    pub use_cross_entropy: bool,

    /// Training CSV; nothing happens without it
    pub train_path: Option<PathBuf>,

    /// Held-out CSV evaluated at every epoch boundary
    pub test_path: Option<PathBuf>,

    /// Where to write the learned factor vectors
    pub dump_path: Option<PathBuf>,

    /// Optimizer choice
    pub optimizer: OptimizerKind,

    /// Field delimiter of the input files
    pub delimiter: char,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            epochs: 500,
            learning_rate: 0.001,
            factor_dim: 8,
            use_cross_entropy: false,
            train_path: None,
            test_path: None,
            dump_path: None,
            optimizer: OptimizerKind::Adam,
            delimiter: ',',
        }
    }
}

impl TrainConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::open(path.as_ref()).map_err(|source| crate::FmError::Load {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.batch_size == 0 {
            return Err(crate::FmError::Config(
                "batch_size must be > 0".to_string(),
            ));
        }

        if self.factor_dim == 0 {
            return Err(crate::FmError::Config(
                "factor_dim must be > 0".to_string(),
            ));
        }

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(crate::FmError::Config(format!(
                "Invalid learning_rate: {}. Must be a positive number",
                self.learning_rate
            )));
        }

        if !self.delimiter.is_ascii() {
            return Err(crate::FmError::Config(format!(
                "Invalid delimiter: {:?}. Must be a single ASCII character",
                self.delimiter
            )));
        }

        Ok(())
    }

    /// Loss selected by `use_cross_entropy`
    pub fn loss_kind(&self) -> LossKind {
        if self.use_cross_entropy {
            LossKind::CrossEntropy
        } else {
            LossKind::SquaredError
        }
    }

    /// The part of the configuration the model needs
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            factor_dim: self.factor_dim,
            learning_rate: self.learning_rate,
            loss: self.loss_kind(),
            optimizer: self.optimizer,
        }
    }
}

/// Hyperparameters handed to `FactorModel::build`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub factor_dim: usize,
    pub learning_rate: f64,
    pub loss: LossKind,
    pub optimizer: OptimizerKind,
}

impl Default for ModelConfig {
    fn default() -> Self {
        TrainConfig::default().model_config()
    }
}
