/// Training infrastructure for the Factorization Machine
pub mod export;
pub mod trainer;

pub use export::{dump_factors, write_factors};
pub use trainer::{run, total_steps, EpochReport, Trainer, TrainingSummary};
