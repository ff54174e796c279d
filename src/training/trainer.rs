/// Training loop for the Factorization Machine
use candle_core::Device;
use std::path::Path;

use crate::config::TrainConfig;
use crate::data::DataSource;
use crate::models::FactorModel;
use super::export::dump_factors;

/// Losses reported when an epoch boundary is crossed
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Index of the epoch just entered
    pub epoch: usize,
    /// Mean training loss since the previous boundary
    pub train_loss: f32,
    /// Mean held-out loss over one full pass, if a test set is loaded
    pub test_loss: Option<f32>,
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub steps: usize,
    pub epochs: Vec<EpochReport>,
    pub final_loss: f32,
    pub final_test_loss: Option<f32>,
}

/// Optimizer steps for `epochs` passes: `epochs * data_size / batch_size`, at least 1
pub fn total_steps(epochs: usize, data_size: usize, batch_size: usize) -> crate::Result<usize> {
    let rows = epochs.checked_mul(data_size).ok_or_else(|| {
        crate::FmError::Config(format!(
            "{} epochs over {} rows overflows the step counter",
            epochs, data_size
        ))
    })?;
    Ok((rows / batch_size).max(1))
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Drives a `FactorModel` over a cycling training source
pub struct Trainer<M: FactorModel> {
    model: M,
    train_data: DataSource,
    test_data: Option<DataSource>,
    config: TrainConfig,
    step: usize,
}

impl<M: FactorModel> Trainer<M> {
    /// Build the model for the training data's feature count
    pub fn new(
        config: TrainConfig,
        train_data: DataSource,
        test_data: Option<DataSource>,
        device: &Device,
    ) -> crate::Result<Self> {
        if train_data.batch_size() != config.batch_size {
            return Err(crate::FmError::Config(format!(
                "Training data serves batches of {}, config expects {}",
                train_data.batch_size(),
                config.batch_size
            )));
        }

        if let Some(ref test) = test_data {
            if test.batch_size() != config.batch_size {
                return Err(crate::FmError::Config(format!(
                    "Test data serves batches of {}, config expects {}",
                    test.batch_size(),
                    config.batch_size
                )));
            }
            if test.feature_count() != train_data.feature_count() {
                return Err(crate::FmError::Data(format!(
                    "Test data has {} features, training data has {}",
                    test.feature_count(),
                    train_data.feature_count()
                )));
            }
        }

        let model = M::build(train_data.feature_count(), &config.model_config(), device)?;

        Ok(Self {
            model,
            train_data,
            test_data,
            config,
            step: 0,
        })
    }

    /// Steps the full run will take
    pub fn total_steps(&self) -> crate::Result<usize> {
        total_steps(self.config.epochs, self.train_data.size(), self.config.batch_size)
    }

    /// Optimizer steps taken so far
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mean loss over `ceil(test_size / batch_size)` held-out batches.
    ///
    /// The held-out cursor is not rewound, so consecutive passes start
    /// where the previous one stopped.
    pub fn evaluate_test(&mut self) -> crate::Result<Option<f32>> {
        let Some(test) = self.test_data.as_mut() else {
            return Ok(None);
        };

        let mut losses = Vec::with_capacity(test.num_batches());
        for _ in 0..test.num_batches() {
            let batch = test.next_batch();
            losses.push(self.model.evaluate(&batch)?);
        }

        Ok(Some(mean(&losses)))
    }

    /// Full training loop
    pub fn train(&mut self) -> crate::Result<TrainingSummary> {
        let data_size = self.train_data.size();
        let batch_size = self.config.batch_size;
        let total_steps = self.total_steps()?;

        log::debug!(
            "Starting training: {} steps, {} epochs, batch_size={}",
            total_steps,
            self.config.epochs,
            batch_size
        );

        let mut losses = Vec::new();
        let mut reports = Vec::new();
        let mut current_epoch = 0;
        let mut avg_loss = 0.0;

        for step in 0..total_steps {
            let batch = self.train_data.next_batch();
            let loss = self.model.step(&batch)?;
            losses.push(loss);
            self.step += 1;

            let epoch = step * batch_size / data_size;
            if epoch > current_epoch {
                current_epoch = epoch;
                avg_loss = mean(&losses);
                losses.clear();

                let test_loss = self.evaluate_test()?;
                match test_loss {
                    Some(test_loss) => log::info!(
                        "Epoch: {}, Average loss: {} Test loss: {}",
                        epoch,
                        avg_loss,
                        test_loss
                    ),
                    None => log::info!("Epoch: {}, Average loss: {}", epoch, avg_loss),
                }

                reports.push(EpochReport {
                    epoch,
                    train_loss: avg_loss,
                    test_loss,
                });
            }
        }

        let final_loss = if losses.is_empty() { avg_loss } else { mean(&losses) };
        log::info!("Train finished! Final loss: {}", final_loss);

        let final_test_loss = self.evaluate_test()?;
        if let Some(test_loss) = final_test_loss {
            log::info!("Final test loss: {}", test_loss);
        }

        Ok(TrainingSummary {
            steps: self.step,
            epochs: reports,
            final_loss,
            final_test_loss,
        })
    }

    /// Write the learned latent vectors, one line per training feature
    pub fn dump_factors<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let factors = self.model.export_factors()?;
        dump_factors(path.as_ref(), self.train_data.feature_names(), &factors)?;
        log::info!("Factor vectors dumped to {:?}", path.as_ref());
        Ok(())
    }
}

/// Run a full training job described by `config`.
///
/// Returns `Ok(None)` without doing anything when no training path is set.
/// A test file that cannot be opened disables evaluation instead of
/// aborting; malformed test data is still an error.
pub fn run<M: FactorModel>(
    config: TrainConfig,
    device: &Device,
) -> crate::Result<Option<TrainingSummary>> {
    let Some(train_path) = config.train_path.clone() else {
        return Ok(None);
    };
    config.validate()?;

    let delimiter = config.delimiter as u8;
    let train_data = DataSource::load(&train_path, config.batch_size, delimiter)?;
    log::info!(
        "Train data set loaded: {} rows, {} features",
        train_data.size(),
        train_data.feature_count()
    );

    let test_data = match config.test_path {
        Some(ref test_path) => match DataSource::load(test_path, config.batch_size, delimiter) {
            Ok(test_data) => {
                log::info!("Test data set loaded: {} rows", test_data.size());
                Some(test_data)
            }
            Err(e @ crate::FmError::Load { .. }) => {
                log::warn!("Test data not loaded, evaluation disabled: {}", e);
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };

    let dump_path = config.dump_path.clone();
    let mut trainer = Trainer::<M>::new(config, train_data, test_data, device)?;
    let summary = trainer.train()?;

    if let Some(path) = dump_path {
        trainer.dump_factors(path)?;
    }

    Ok(Some(summary))
}
