/// CSV dataset loader: label in column 0, named numeric features after it
use ndarray::{Array2, ArrayView1, Axis};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::Batch;

/// Labeled tabular dataset held in memory
#[derive(Debug, Clone)]
pub struct CsvDataset {
    features: Array2<f32>,      // [N, feature_count]
    labels: Array2<f32>,        // [N, 1]
    feature_names: Vec<String>, // header columns 1..
}

impl CsvDataset {
    /// Load from a delimited file with a header row
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> crate::Result<Self> {
        let path = path.as_ref();

        log::debug!("Loading CSV dataset from: {:?}", path);

        let file = File::open(path).map_err(|source| crate::FmError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_reader(BufReader::new(file), delimiter)?;

        log::debug!(
            "Loaded {:?}: {} rows, {} features",
            path,
            dataset.len(),
            dataset.feature_count()
        );

        Ok(dataset)
    }

    /// Parse CSV content from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> crate::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header = reader.headers()?.clone();
        if header.len() < 2 {
            return Err(crate::FmError::Data(format!(
                "Header needs a label column and at least one feature column, got {} column(s)",
                header.len()
            )));
        }

        let feature_names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        let feature_count = feature_names.len();

        let mut values = Vec::new();
        let mut labels = Vec::new();
        for record in reader.records() {
            let record = record?;
            // Header is line 1
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            for (col, field) in record.iter().enumerate() {
                let value: f32 = field.parse().map_err(|e| {
                    crate::FmError::Data(format!(
                        "line {}, column {}: cannot parse {:?} as a number: {}",
                        line, col, field, e
                    ))
                })?;
                if col == 0 {
                    labels.push(value);
                } else {
                    values.push(value);
                }
            }
        }

        let num_rows = labels.len();
        if num_rows == 0 {
            return Err(crate::FmError::Data("CSV has a header but no data rows".to_string()));
        }

        let features = Array2::from_shape_vec((num_rows, feature_count), values)
            .map_err(|e| crate::FmError::Data(format!("Feature matrix shape: {}", e)))?;
        let labels = Array2::from_shape_vec((num_rows, 1), labels)
            .map_err(|e| crate::FmError::Data(format!("Label column shape: {}", e)))?;

        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    /// Get number of rows
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Get number of feature columns
    pub fn feature_count(&self) -> usize {
        self.features.ncols()
    }

    /// Feature names in matrix column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Get feature row at index
    pub fn get_features(&self, idx: usize) -> ArrayView1<f32> {
        self.features.row(idx)
    }

    /// Get label at index
    pub fn get_label(&self, idx: usize) -> f32 {
        self.labels[[idx, 0]]
    }
}

/// Cycles over a dataset in fixed-size batches, forever, in file order
#[derive(Debug, Clone)]
pub struct DataSource {
    dataset: CsvDataset,
    batch_size: usize,
    cursor: usize,
}

impl DataSource {
    /// Create a source over an already loaded dataset
    pub fn new(dataset: CsvDataset, batch_size: usize) -> crate::Result<Self> {
        if batch_size == 0 {
            return Err(crate::FmError::Config("batch_size must be > 0".to_string()));
        }

        Ok(Self {
            dataset,
            batch_size,
            cursor: 0,
        })
    }

    /// Load a CSV file and wrap it in a source
    pub fn load<P: AsRef<Path>>(path: P, batch_size: usize, delimiter: u8) -> crate::Result<Self> {
        Self::new(CsvDataset::from_path(path, delimiter)?, batch_size)
    }

    /// Total row count
    pub fn size(&self) -> usize {
        self.dataset.len()
    }

    /// Number of feature columns
    pub fn feature_count(&self) -> usize {
        self.dataset.feature_count()
    }

    /// Feature names in matrix column order
    pub fn feature_names(&self) -> &[String] {
        self.dataset.feature_names()
    }

    /// Rows per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Offset of the next batch's first row
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Batches needed to cover the dataset once
    pub fn num_batches(&self) -> usize {
        (self.size() + self.batch_size - 1) / self.batch_size
    }

    /// Get dataset reference
    pub fn dataset(&self) -> &CsvDataset {
        &self.dataset
    }

    /// Next `batch_size` rows starting at the cursor.
    ///
    /// Past the last row the batch continues from row 0, so every batch has
    /// exactly `batch_size` rows. When `batch_size > size()` rows repeat
    /// within one batch.
    pub fn next_batch(&mut self) -> Batch {
        let size = self.size();
        let indices: Vec<usize> = (0..self.batch_size)
            .map(|i| (self.cursor + i) % size)
            .collect();

        self.cursor = (self.cursor + self.batch_size) % size;

        Batch {
            features: self.dataset.features.select(Axis(0), &indices),
            labels: self.dataset.labels.select(Axis(0), &indices),
        }
    }
}
