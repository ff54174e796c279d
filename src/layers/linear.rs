/// First-order term of a Factorization Machine: `w0 + x·w`
use candle_core::{Result, Tensor};
use candle_nn::{Init, VarBuilder};

/// Global bias plus one weight per feature, both starting at zero
pub struct FirstOrder {
    weight: Tensor, // [num_features, 1]
    bias: Tensor,   // [1]
}

impl FirstOrder {
    pub fn new(num_features: usize, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints((num_features, 1), "weight", Init::Const(0.0))?;
        let bias = vb.get_with_hints(1, "bias", Init::Const(0.0))?;
        Ok(Self { weight, bias })
    }

    /// Forward pass: [batch, num_features] -> [batch, 1]
    pub fn forward(&self, inputs: &Tensor) -> Result<Tensor> {
        inputs.matmul(&self.weight)?.broadcast_add(&self.bias)
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }
}
