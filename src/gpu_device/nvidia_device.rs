use nvml_wrapper::{
    Device, Nvml, enum_wrappers::device::TemperatureSensor,
    enums::device::FanControlPolicy,
};
use tracing::info;

use crate::gpu_device::{FanPolicy, GpuBackend, HardwareError};

// NVML backed hardware access.
// NVML is shut down when the backend is dropped.
pub struct NvidiaBackend {
    nvml: Nvml,
}

impl NvidiaBackend {
    // Load the NVML library and initialize it
    pub fn init() -> Result<Self, HardwareError> {
        let nvml = Nvml::init()?;

        info!("NVML successfully initialized");

        Ok(Self { nvml })
    }

    // Return a NVML device handle.
    // This function can fail and return an error
    fn device(&self, index: u32) -> Result<Device<'_>, HardwareError> {
        Ok(self.nvml.device_by_index(index)?)
    }
}

impl GpuBackend for NvidiaBackend {
    fn device_count(&self) -> Result<u32, HardwareError> {
        Ok(self.nvml.device_count()?)
    }

    fn fan_count(&self, device: u32) -> Result<u32, HardwareError> {
        Ok(self.device(device)?.num_fans()?)
    }

    fn temperature(&self, device: u32) -> Result<i32, HardwareError> {
        let temp = self.device(device)?.temperature(TemperatureSensor::Gpu)?;

        Ok(i32::try_from(temp).unwrap_or(i32::MAX))
    }

    fn fan_speed(&self, device: u32, fan: u32) -> Result<u32, HardwareError> {
        Ok(self.device(device)?.fan_speed(fan)?)
    }

    fn set_fan_policy(
        &mut self,
        device: u32,
        fan: u32,
        policy: FanPolicy,
    ) -> Result<(), HardwareError> {
        let policy = match policy {
            FanPolicy::Auto => FanControlPolicy::TemperatureContinousSw,
            FanPolicy::Manual => FanControlPolicy::Manual,
        };

        let mut handle = self.device(device)?;
        handle.set_fan_control_policy(fan, policy)?;

        Ok(())
    }

    fn set_fan_speed(
        &mut self,
        device: u32,
        fan: u32,
        speed: u32,
    ) -> Result<(), HardwareError> {
        let mut handle = self.device(device)?;
        handle.set_fan_speed(fan, speed)?;

        Ok(())
    }
}

impl Drop for NvidiaBackend {
    fn drop(&mut self) {
        info!("Shutting down NVML");
    }
}
