use std::cell::Cell;

use nvml_wrapper::error::NvmlError;

use crate::gpu_device::{FanPolicy, GpuBackend, HardwareError};

// In memory fan used by the fan manager tests
#[derive(Debug, Clone)]
pub struct MockFan {
    pub speed: u32,
    pub policy: FanPolicy,

    pub readable: bool,
    pub manual_supported: bool,
    pub speed_supported: bool,
    pub fail_policy: bool,
    pub fail_writes: bool,

    // Every speed successfully written to the fan
    pub writes: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct MockDevice {
    // None simulates a failed temperature read
    pub temperature: Option<i32>,
    // None simulates a failed fan count read
    pub fans: Option<Vec<MockFan>>,
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    pub devices: Vec<MockDevice>,
    pub fail_device_count: bool,

    // Number of temperature reads per device
    pub temperature_reads: Vec<Cell<u32>>,
}

impl MockFan {
    pub fn new(speed: u32) -> Self {
        Self {
            speed,
            policy: FanPolicy::Auto,
            readable: true,
            manual_supported: true,
            speed_supported: true,
            fail_policy: false,
            fail_writes: false,
            writes: Vec::new(),
        }
    }

    pub fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn without_manual_control(mut self) -> Self {
        self.manual_supported = false;
        self
    }

    pub fn without_speed_control(mut self) -> Self {
        self.speed_supported = false;
        self
    }

    pub fn failing_policy(mut self) -> Self {
        self.fail_policy = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl MockDevice {
    pub fn new(temperature: i32, fans: Vec<MockFan>) -> Self {
        Self {
            temperature: Some(temperature),
            fans: Some(fans),
        }
    }
}

impl MockBackend {
    pub fn new(devices: Vec<MockDevice>) -> Self {
        let temperature_reads = vec![Cell::new(0); devices.len()];

        Self {
            devices,
            fail_device_count: false,
            temperature_reads,
        }
    }

    pub fn fan(&self, device: u32, fan: u32) -> &MockFan {
        &self.devices[device as usize].fans.as_ref().unwrap()[fan as usize]
    }

    pub fn fan_mut(&mut self, device: u32, fan: u32) -> &mut MockFan {
        &mut self.devices[device as usize].fans.as_mut().unwrap()[fan as usize]
    }

    pub fn temperature_reads(&self, device: u32) -> u32 {
        self.temperature_reads[device as usize].get()
    }

    pub fn set_temperature(&mut self, device: u32, temperature: Option<i32>) {
        self.devices[device as usize].temperature = temperature;
    }

    fn device(&self, device: u32) -> Result<&MockDevice, HardwareError> {
        self.devices
            .get(device as usize)
            .ok_or(HardwareError::Nvml(NvmlError::InvalidArg))
    }

    fn find_fan(&mut self, device: u32, fan: u32) -> Result<&mut MockFan, HardwareError> {
        self.devices
            .get_mut(device as usize)
            .and_then(|d| d.fans.as_mut())
            .and_then(|fans| fans.get_mut(fan as usize))
            .ok_or(HardwareError::Nvml(NvmlError::InvalidArg))
    }
}

impl GpuBackend for MockBackend {
    fn device_count(&self) -> Result<u32, HardwareError> {
        if self.fail_device_count {
            return Err(HardwareError::Nvml(NvmlError::Uninitialized));
        }

        Ok(self.devices.len() as u32)
    }

    fn fan_count(&self, device: u32) -> Result<u32, HardwareError> {
        self.device(device)?
            .fans
            .as_ref()
            .map(|fans| fans.len() as u32)
            .ok_or(HardwareError::Nvml(NvmlError::Unknown))
    }

    fn temperature(&self, device: u32) -> Result<i32, HardwareError> {
        if let Some(reads) = self.temperature_reads.get(device as usize) {
            reads.set(reads.get() + 1);
        }

        self.device(device)?
            .temperature
            .ok_or(HardwareError::Nvml(NvmlError::GpuLost))
    }

    fn fan_speed(&self, device: u32, fan: u32) -> Result<u32, HardwareError> {
        let fan = self
            .device(device)?
            .fans
            .as_ref()
            .and_then(|fans| fans.get(fan as usize))
            .ok_or(HardwareError::Nvml(NvmlError::InvalidArg))?;

        if fan.readable {
            Ok(fan.speed)
        } else {
            Err(HardwareError::Nvml(NvmlError::Unknown))
        }
    }

    fn set_fan_policy(
        &mut self,
        device: u32,
        fan: u32,
        policy: FanPolicy,
    ) -> Result<(), HardwareError> {
        let fan = self.find_fan(device, fan)?;

        if !fan.manual_supported {
            return Err(HardwareError::NotSupported);
        }

        if fan.fail_policy {
            return Err(HardwareError::Nvml(NvmlError::NoPermission));
        }

        fan.policy = policy;

        Ok(())
    }

    fn set_fan_speed(
        &mut self,
        device: u32,
        fan: u32,
        speed: u32,
    ) -> Result<(), HardwareError> {
        let fan = self.find_fan(device, fan)?;

        if !fan.speed_supported {
            return Err(HardwareError::NotSupported);
        }

        if fan.fail_writes {
            return Err(HardwareError::Nvml(NvmlError::Unknown));
        }

        if fan.policy != FanPolicy::Manual {
            return Err(HardwareError::Nvml(NvmlError::NoPermission));
        }

        fan.speed = speed;
        fan.writes.push(speed);

        Ok(())
    }
}
