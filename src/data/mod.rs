/// Data loading modules for FM training
pub mod csv_dataset;

pub use csv_dataset::{CsvDataset, DataSource};

use ndarray::Array2;

/// One mini-batch: features `[batch_size, feature_count]` and labels `[batch_size, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub features: Array2<f32>,
    pub labels: Array2<f32>,
}

impl Batch {
    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Number of feature columns
    pub fn feature_count(&self) -> usize {
        self.features.ncols()
    }
}
