//! Command line surface of the `fm-trainer` binary
use clap::Parser;
use std::path::PathBuf;

use crate::config::{OptimizerKind, TrainConfig};

/// FactorizationMachine trains a Factorization Machine model for regression,
/// classification and prediction on CSV data.
///
/// Every flag is optional. Without `--train-data-path` nothing is done.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file with base settings; explicit flags override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Size of mini-batch [default: 16]
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Passes over the training data [default: 500]
    #[arg(short = 'e', long)]
    pub train_epoch: Option<usize>,

    /// Learning rate for the model [default: 0.001]
    #[arg(short = 'r', long)]
    pub learning_rate: Option<f64>,

    /// Path to load input data
    #[arg(short = 'd', long)]
    pub train_data_path: Option<PathBuf>,

    /// Path to load test data
    #[arg(short = 't', long)]
    pub test_data_path: Option<PathBuf>,

    /// Dimension of the feature vector [default: 8]
    #[arg(short = 'f', long)]
    pub factor_dim: Option<usize>,

    /// Use cross entropy as loss, else MSE is used
    #[arg(short = 'x', long)]
    pub use_cross_entropy: bool,

    /// Path to dump the feature vectors
    #[arg(short = 'o', long)]
    pub dump_factors_path: Option<PathBuf>,

    /// Optimizer [default: adam]
    #[arg(long, value_enum)]
    pub optimizer: Option<OptimizerKind>,

    /// Field delimiter of the CSV files [default: ,]
    #[arg(long)]
    pub delimiter: Option<char>,
}

impl Args {
    /// Resolve into a `TrainConfig`: defaults, then `--config`, then flags
    pub fn into_config(self) -> crate::Result<TrainConfig> {
        let mut config = match self.config {
            Some(ref path) => TrainConfig::from_json_file(path)?,
            None => TrainConfig::default(),
        };

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(epochs) = self.train_epoch {
            config.epochs = epochs;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(factor_dim) = self.factor_dim {
            config.factor_dim = factor_dim;
        }
        if self.use_cross_entropy {
            config.use_cross_entropy = true;
        }
        if let Some(optimizer) = self.optimizer {
            config.optimizer = optimizer;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.train_data_path.is_some() {
            config.train_path = self.train_data_path;
        }
        if self.test_data_path.is_some() {
            config.test_path = self.test_data_path;
        }
        if self.dump_factors_path.is_some() {
            config.dump_path = self.dump_factors_path;
        }

        Ok(config)
    }
}
