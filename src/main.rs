use std::path::Path;

use anyhow::{Context, Result};
use nvfan::{
    arg_parser::ArgsOptions, config::Config, errors::NvfanError,
    fan_manager::FanManager, gpu_device::nvidia_device::NvidiaBackend, logger,
};
use tokio::{
    select,
    signal::{
        ctrl_c,
        unix::{SignalKind, signal},
    },
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse the command line arguments
    let args_options = ArgsOptions::parse();

    logger::init_logging(args_options.log_file_path.as_deref())?;

    // NVML is released when the manager is dropped,
    // including on the early returns below
    let mut fan_manager = match init_fan_manager(&args_options.config_file_path)
    {
        Ok(fan_manager) => fan_manager,
        Err(err) => {
            let err = anyhow::Error::new(err)
                .context("Failed to start the fan control daemon");

            for e in err.chain() {
                error!("{e}");
            }

            return Err(err);
        }
    };

    // This token and tracker will be used to handle graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    // Start the fan speed manager
    {
        let token = token.clone();

        tracker.spawn(async move {
            fan_manager.run(token).await;
        });
    }

    wait_for_termination().await?;

    info!("Termination signal received, shutting down");

    // Cancel the token to communicate the program
    // termination to the running tasks
    token.cancel();

    // Wait for the tasks to finish
    tracker.close();
    tracker.wait().await;

    Ok(())
}

// Load the configuration, initialize NVML and seed the fan states
fn init_fan_manager(
    config_path: &Path,
) -> Result<FanManager<NvidiaBackend>, NvfanError> {
    let config = Config::load(config_path)?;
    let backend = NvidiaBackend::init()?;

    Ok(FanManager::new(backend, config)?)
}

// Wait for SIGINT or SIGTERM
async fn wait_for_termination() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())
        .with_context(|| "Failed to install SIGTERM handler")?;

    select! {
        res = ctrl_c() => res.with_context(|| "Failed to listen for SIGINT")?,
        _ = sigterm.recv() => {},
    }

    Ok(())
}
