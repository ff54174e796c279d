/// Factorization Machine model and the capability the trainer drives
use candle_core::{DType, Device, Result as CandleResult, Tensor};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap, SGD};

use crate::config::{LossKind, ModelConfig, OptimizerKind};
use crate::data::Batch;
use crate::layers::{FirstOrder, Interaction};

/// What the training loop needs from a model.
///
/// The trainer only ever talks to this trait, so the loop can run against a
/// stub in tests.
pub trait FactorModel: Sized {
    /// Create the model for `feature_count` input features
    fn build(feature_count: usize, config: &ModelConfig, device: &Device) -> crate::Result<Self>;

    /// One optimizer update on `batch`; returns the loss before the update
    fn step(&mut self, batch: &Batch) -> crate::Result<f32>;

    /// Loss on `batch` without touching the parameters
    fn evaluate(&self, batch: &Batch) -> crate::Result<f32>;

    /// Latent vector of every input feature, in feature order
    fn export_factors(&self) -> crate::Result<Vec<Vec<f32>>>;
}

/// Optimizer selected by `OptimizerKind`
enum FmOptimizer {
    Adam(AdamW),
    Sgd(SGD),
}

impl FmOptimizer {
    fn new(kind: OptimizerKind, varmap: &VarMap, learning_rate: f64) -> CandleResult<Self> {
        match kind {
            OptimizerKind::Adam => {
                let params = ParamsAdamW {
                    lr: learning_rate,
                    beta1: 0.9,
                    beta2: 0.999,
                    eps: 1e-8,
                    weight_decay: 0.0,
                };
                Ok(Self::Adam(AdamW::new(varmap.all_vars(), params)?))
            }
            OptimizerKind::Sgd => Ok(Self::Sgd(SGD::new(varmap.all_vars(), learning_rate)?)),
        }
    }

    /// Backward pass + parameter update
    fn backward_step(&mut self, loss: &Tensor) -> CandleResult<()> {
        match self {
            Self::Adam(opt) => opt.backward_step(loss),
            Self::Sgd(opt) => opt.backward_step(loss),
        }
    }
}

/// Second-order Factorization Machine
///
/// `ŷ = w0 + x·w + ½ Σ_f [(x·V)_f² − (x²·V²)_f]`
pub struct FactorizationMachine {
    config: ModelConfig,
    varmap: VarMap,
    first_order: FirstOrder,
    interaction: Interaction,
    optimizer: FmOptimizer,
    device: Device,
}

impl FactorizationMachine {
    /// Create new FactorizationMachine
    pub fn new(feature_count: usize, config: ModelConfig, device: Device) -> crate::Result<Self> {
        if feature_count == 0 || config.factor_dim == 0 {
            return Err(crate::FmError::Config(format!(
                "feature_count ({}) and factor_dim ({}) must be > 0",
                feature_count, config.factor_dim
            )));
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let first_order = FirstOrder::new(feature_count, vb.pp("linear"))?;
        let interaction = Interaction::new(feature_count, config.factor_dim, vb.pp("interaction"))?;
        let optimizer = FmOptimizer::new(config.optimizer, &varmap, config.learning_rate)?;

        log::debug!(
            "Built FM: {} features, factor_dim={}, loss={:?}, optimizer={:?}",
            feature_count,
            config.factor_dim,
            config.loss,
            config.optimizer
        );

        Ok(Self {
            config,
            varmap,
            first_order,
            interaction,
            optimizer,
            device,
        })
    }

    /// Raw model output (logits for cross-entropy) [batch, 1]
    pub fn forward(&self, inputs: &Tensor) -> CandleResult<Tensor> {
        self.first_order.forward(inputs)? + self.interaction.forward(inputs)?
    }

    /// Predictions for a batch: probabilities under cross-entropy, raw values otherwise
    pub fn predict(&self, batch: &Batch) -> crate::Result<Vec<f32>> {
        let (inputs, _) = self.batch_tensors(batch)?;
        let output = self.forward(&inputs)?;
        let output = match self.config.loss {
            LossKind::CrossEntropy => candle_nn::ops::sigmoid(&output)?,
            LossKind::SquaredError => output,
        };
        Ok(output.flatten_all()?.to_vec1::<f32>()?)
    }

    /// Total number of trainable scalars
    pub fn num_parameters(&self) -> usize {
        self.varmap
            .all_vars()
            .iter()
            .map(|v| v.as_tensor().elem_count())
            .sum()
    }

    /// Move an ndarray batch onto the model's device
    fn batch_tensors(&self, batch: &Batch) -> CandleResult<(Tensor, Tensor)> {
        let inputs = Tensor::from_vec(
            batch.features.iter().copied().collect::<Vec<f32>>(),
            batch.features.dim(),
            &self.device,
        )?;
        let targets = Tensor::from_vec(
            batch.labels.iter().copied().collect::<Vec<f32>>(),
            batch.labels.dim(),
            &self.device,
        )?;
        Ok((inputs, targets))
    }

    fn compute_loss(&self, output: &Tensor, targets: &Tensor) -> CandleResult<Tensor> {
        match self.config.loss {
            LossKind::SquaredError => loss::mse(output, targets),
            LossKind::CrossEntropy => sigmoid_cross_entropy(output, targets),
        }
    }
}

impl FactorModel for FactorizationMachine {
    fn build(feature_count: usize, config: &ModelConfig, device: &Device) -> crate::Result<Self> {
        Self::new(feature_count, config.clone(), device.clone())
    }

    fn step(&mut self, batch: &Batch) -> crate::Result<f32> {
        let (inputs, targets) = self.batch_tensors(batch)?;
        let output = self.forward(&inputs)?;
        let loss = self.compute_loss(&output, &targets)?;
        let loss_val = loss.to_scalar::<f32>()?;

        self.optimizer.backward_step(&loss)?;

        Ok(loss_val)
    }

    fn evaluate(&self, batch: &Batch) -> crate::Result<f32> {
        let (inputs, targets) = self.batch_tensors(batch)?;
        let output = self.forward(&inputs)?;
        Ok(self.compute_loss(&output, &targets)?.to_scalar::<f32>()?)
    }

    fn export_factors(&self) -> crate::Result<Vec<Vec<f32>>> {
        Ok(self.interaction.factors().to_vec2::<f32>()?)
    }
}

/// Mean sigmoid cross-entropy on logits, stable for large |logits|:
/// `max(z, 0) − z·y + ln(1 + e^{−|z|})`
pub fn sigmoid_cross_entropy(logits: &Tensor, targets: &Tensor) -> CandleResult<Tensor> {
    let positive = logits.relu()?;
    let softplus = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    ((positive - (logits * targets)?)? + softplus)?.mean_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn batch(rows: usize, features: Vec<f32>, labels: Vec<f32>) -> Batch {
        let cols = features.len() / rows;
        Batch {
            features: Array2::from_shape_vec((rows, cols), features).unwrap(),
            labels: Array2::from_shape_vec((rows, 1), labels).unwrap(),
        }
    }

    fn config(loss: LossKind, learning_rate: f64) -> ModelConfig {
        ModelConfig {
            factor_dim: 2,
            learning_rate,
            loss,
            optimizer: OptimizerKind::Adam,
        }
    }

    #[test]
    fn test_build_shapes() -> crate::Result<()> {
        let model = FactorizationMachine::build(3, &config(LossKind::SquaredError, 0.01), &Device::Cpu)?;

        let factors = model.export_factors()?;
        assert_eq!(factors.len(), 3);
        assert!(factors.iter().all(|v| v.len() == 2));
        // w0 + w + V
        assert_eq!(model.num_parameters(), 1 + 3 + 3 * 2);

        Ok(())
    }

    #[test]
    fn test_rejects_empty_shapes() {
        let result = FactorizationMachine::build(0, &config(LossKind::SquaredError, 0.01), &Device::Cpu);
        assert!(matches!(result, Err(crate::FmError::Config(_))));
    }

    #[test]
    fn test_initial_cross_entropy_is_ln2() -> crate::Result<()> {
        let model = FactorizationMachine::build(2, &config(LossKind::CrossEntropy, 0.01), &Device::Cpu)?;
        let data = batch(2, vec![1.0, 0.0, 0.0, 1.0], vec![1.0, 0.0]);

        // Zero weights and near-zero factors give logits close to 0
        assert_relative_eq!(model.evaluate(&data)?, 2f32.ln(), epsilon = 1e-3);

        let probs = model.predict(&data)?;
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| (p - 0.5).abs() < 1e-3));

        Ok(())
    }

    #[test]
    fn test_stable_cross_entropy() -> CandleResult<()> {
        let device = Device::Cpu;
        let logits = Tensor::from_vec(vec![100f32, -100.0], (2, 1), &device)?;
        let targets = Tensor::from_vec(vec![1f32, 0.0], (2, 1), &device)?;
        let loss = sigmoid_cross_entropy(&logits, &targets)?.to_scalar::<f32>()?;
        assert!(loss.is_finite());
        assert!(loss < 1e-6);

        let wrong = Tensor::from_vec(vec![0f32, 1.0], (2, 1), &device)?;
        let loss = sigmoid_cross_entropy(&logits, &wrong)?.to_scalar::<f32>()?;
        assert_relative_eq!(loss, 100.0, epsilon = 1e-3);

        Ok(())
    }

    #[test]
    fn test_evaluate_leaves_parameters_alone() -> crate::Result<()> {
        let model = FactorizationMachine::build(2, &config(LossKind::SquaredError, 0.1), &Device::Cpu)?;
        let data = batch(2, vec![1.0, 2.0, 3.0, 4.0], vec![1.0, -1.0]);

        let before = model.export_factors()?;
        let first = model.evaluate(&data)?;
        let second = model.evaluate(&data)?;
        assert_eq!(first, second);
        assert_eq!(before, model.export_factors()?);

        Ok(())
    }

    #[test]
    fn test_step_reduces_squared_error() -> crate::Result<()> {
        for optimizer in [OptimizerKind::Adam, OptimizerKind::Sgd] {
            let cfg = ModelConfig {
                optimizer,
                ..config(LossKind::SquaredError, 0.05)
            };
            let mut model = FactorizationMachine::build(2, &cfg, &Device::Cpu)?;
            // y = 2 * x0
            let data = batch(
                4,
                vec![1.0, 0.0, 0.5, 1.0, -1.0, 0.0, 0.0, 1.0],
                vec![2.0, 1.0, -2.0, 0.0],
            );

            let initial = model.evaluate(&data)?;
            for _ in 0..200 {
                model.step(&data)?;
            }
            let trained = model.evaluate(&data)?;
            assert!(
                trained < initial * 0.5,
                "{:?}: loss {} -> {}",
                optimizer,
                initial,
                trained
            );
        }

        Ok(())
    }

    #[test]
    fn test_step_updates_factors() -> crate::Result<()> {
        let mut model = FactorizationMachine::build(2, &config(LossKind::SquaredError, 0.1), &Device::Cpu)?;
        let data = batch(2, vec![1.0, 1.0, 1.0, 2.0], vec![3.0, 5.0]);

        let before = model.export_factors()?;
        model.step(&data)?;
        assert_ne!(before, model.export_factors()?);

        Ok(())
    }
}
