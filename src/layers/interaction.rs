/// Pairwise feature interaction of a Factorization Machine
///
/// For inputs `x` and latent factors `V` the interaction of every feature
/// pair `(i, j)` is `<v_i, v_j> x_i x_j`. Summed over `i < j` this equals
/// `½ Σ_f [(x·V)_f² − (x²·V²)_f]`, which costs O(n·k) instead of O(n²·k).
use candle_core::{Result, Tensor};
use candle_nn::{Init, VarBuilder};

/// Standard deviation of the initial latent factors
pub const FACTOR_INIT_STDEV: f64 = 0.01;

/// Interaction term over a batch
///
/// # Arguments
/// * `inputs` - Feature matrix [batch, num_features]
/// * `factors` - Latent factors [num_features, factor_dim]
///
/// # Returns
/// Interaction value per row [batch, 1]
pub fn pairwise_interaction(inputs: &Tensor, factors: &Tensor) -> Result<Tensor> {
    let sum_sq = inputs.matmul(factors)?.sqr()?;
    let sq_sum = inputs.sqr()?.matmul(&factors.sqr()?)?;
    (sum_sq - sq_sum)?.sum_keepdim(1)?.affine(0.5, 0.0)
}

/// Learnable latent factors, one row per input feature
pub struct Interaction {
    factors: Tensor,
}

impl Interaction {
    /// Create new interaction layer
    ///
    /// # Arguments
    /// * `num_features` - Input dimension
    /// * `factor_dim` - Length of each latent vector
    /// * `vb` - VarBuilder for parameter initialization
    pub fn new(num_features: usize, factor_dim: usize, vb: VarBuilder) -> Result<Self> {
        let init = Init::Randn {
            mean: 0.0,
            stdev: FACTOR_INIT_STDEV,
        };
        let factors = vb.get_with_hints((num_features, factor_dim), "factors", init)?;
        Ok(Self { factors })
    }

    pub fn forward(&self, inputs: &Tensor) -> Result<Tensor> {
        pairwise_interaction(inputs, &self.factors)
    }

    /// Latent factors [num_features, factor_dim]
    pub fn factors(&self) -> &Tensor {
        &self.factors
    }
}
