use thiserror::Error;

use crate::{
    config::ConfigError, fan_manager::FanManagerError, gpu_device::HardwareError,
};

// The main daemon error type
#[derive(Debug, Error)]
pub enum NvfanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Hardware(#[from] HardwareError),
    #[error(transparent)]
    FanManager(#[from] FanManagerError),
}
