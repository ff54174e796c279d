/// Train a Factorization Machine from CSV data
use candle_core::Device;
use clap::Parser;
use fm_trainer::cli::Args;
use fm_trainer::{training, FactorizationMachine};

fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Device setup - Try CUDA first, fallback to CPU
    let device = if candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)?
    } else {
        Device::Cpu
    };
    log::debug!("Using device: {:?}", device);
    log::debug!("Configuration: {:#?}", config);

    if training::run::<FactorizationMachine>(config, &device)?.is_none() {
        log::debug!("No training data path given, nothing to do");
    }

    Ok(())
}
