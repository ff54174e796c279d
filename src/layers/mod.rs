/// Neural network layer primitives
///
/// - Linear (first-order) term with zero initialization
/// - Pairwise interaction term factorized through latent vectors

pub mod interaction;
pub mod linear;

pub use interaction::{pairwise_interaction, Interaction};
pub use linear::FirstOrder;
