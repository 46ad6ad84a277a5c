use nvml_wrapper::error::NvmlError;
use thiserror::Error;

#[cfg(test)]
pub mod mock_device;
pub mod nvidia_device;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Operation not supported by the device")]
    NotSupported,
    #[error(transparent)]
    Nvml(NvmlError),
}

impl From<NvmlError> for HardwareError {
    fn from(err: NvmlError) -> Self {
        match err {
            NvmlError::NotSupported => Self::NotSupported,
            err => Self::Nvml(err),
        }
    }
}

// Fan control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanPolicy {
    // The driver controls the fan speed
    Auto,
    // The fan speed is set by the daemon
    Manual,
}

// Hardware access layer used by the fan manager.
// Devices and fans are addressed by index, every call
// can fail independently of the others.
pub trait GpuBackend {
    // Return the number of GPUs on the system
    fn device_count(&self) -> Result<u32, HardwareError>;

    // Return the number of fans on the given GPU
    fn fan_count(&self, device: u32) -> Result<u32, HardwareError>;

    // Return the GPU temperature in °C
    fn temperature(&self, device: u32) -> Result<i32, HardwareError>;

    // Return the current fan speed in percent
    fn fan_speed(&self, device: u32, fan: u32) -> Result<u32, HardwareError>;

    fn set_fan_policy(
        &mut self,
        device: u32,
        fan: u32,
        policy: FanPolicy,
    ) -> Result<(), HardwareError>;

    // Set the fan speed in percent, the fan must be in manual policy
    fn set_fan_speed(
        &mut self,
        device: u32,
        fan: u32,
        speed: u32,
    ) -> Result<(), HardwareError>;
}
