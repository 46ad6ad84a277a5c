use std::time::Duration;

use thiserror::Error;
use tokio::{
    select,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, trace_span, warn};

use crate::{
    config::Config,
    fan_curve::{CurveTable, decide},
    fan_state::{DeviceState, FanState},
    gpu_device::{FanPolicy, GpuBackend, HardwareError},
};

#[derive(Debug, Error)]
pub enum FanManagerError {
    #[error("Unable to get GPU device count")]
    DeviceCount(#[source] HardwareError),
    #[error("No GPU devices found")]
    NoDevices,
    #[error("Found {0} GPU device(s), but none has a controllable fan")]
    NoControllableFans(u32),
}

// Drive the fan speed of every GPU according to the curve table.
// Fans switched to manual control are handed back to the
// driver when the manager is dropped.
pub struct FanManager<B: GpuBackend> {
    backend: B,

    curve: CurveTable,
    update_interval: Duration,

    // Only devices with at least one fan are stored
    devices: Vec<DeviceState>,
}

impl<B: GpuBackend> FanManager<B> {
    // Discover the GPUs and seed the fan states from the hardware
    pub fn new(backend: B, config: Config) -> Result<Self, FanManagerError> {
        let update_interval = config.update_interval();
        let devices = Self::discover_devices(&backend)?;

        Ok(Self {
            backend,
            curve: config.temperature_ranges,
            update_interval,
            devices,
        })
    }

    // Run the fan manager until the token is cancelled
    pub async fn run(&mut self, run_token: CancellationToken) {
        info!("Fan manager: Running every {:?}", self.update_interval);

        let mut ticker = interval(self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately,
        // the first update happens one period after seeding
        ticker.tick().await;

        loop {
            select! {
                _ = run_token.cancelled() => {
                    info!("Fan manager: Quiting");

                    self.restore_auto_control();

                    break;
                },
                _ = ticker.tick() => {
                    trace_span!("updating").in_scope(|| self.update());
                }
            }
        }
    }

    // Run one polling cycle over all of the devices
    pub fn update(&mut self) {
        for device in self.devices.iter_mut() {
            Self::update_device(&mut self.backend, &self.curve, device);
        }
    }

    // Hand every fan set to manual back to the driver
    pub fn restore_auto_control(&mut self) {
        for device in self.devices.iter_mut() {
            for fan in device.fans.iter_mut().filter(|fan| fan.manual_mode) {
                match self.backend.set_fan_policy(
                    device.index,
                    fan.index,
                    FanPolicy::Auto,
                ) {
                    Ok(()) => {
                        debug!(
                            "Restored automatic fan control for GPU {} Fan {}",
                            device.index, fan.index
                        );

                        fan.manual_mode = false;
                    }
                    Err(err) => {
                        error!(
                            "Unable to restore automatic fan control for GPU {} Fan {}: {}",
                            device.index, fan.index, err
                        );
                    }
                }
            }
        }
    }

    pub fn devices(&self) -> &[DeviceState] {
        &self.devices
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // Read the temperature once and evaluate each fan of the device.
    // A failed read skips the whole device for this cycle.
    fn update_device(backend: &mut B, curve: &CurveTable, device: &mut DeviceState) {
        let temp = match backend.temperature(device.index) {
            Ok(temp) => temp,
            Err(err) => {
                warn!(
                    "Unable to get temperature for GPU {}: {}. Skipping cycle for this device",
                    device.index, err
                );

                return;
            }
        };

        for fan in device.fans.iter_mut() {
            let new_speed =
                decide(temp, device.previous_temperature, fan.previous_speed, curve);

            trace!(
                "GPU {} Fan {}: Temp={}°C, PrevTemp={}°C, PrevSpeed={}%, Target={}%",
                device.index,
                fan.index,
                temp,
                device.previous_temperature,
                fan.previous_speed,
                new_speed
            );

            if new_speed == fan.previous_speed {
                continue;
            }

            if !fan.controllable {
                debug!(
                    "GPU {} Fan {} doesn't support manual control, keeping {}%",
                    device.index, fan.index, fan.previous_speed
                );

                continue;
            }

            // Only an unsupported policy excludes the fan,
            // any other failure is retried on the next cycle
            match backend.set_fan_policy(device.index, fan.index, FanPolicy::Manual) {
                Ok(()) => fan.manual_mode = true,
                Err(HardwareError::NotSupported) => {
                    warn!(
                        "Manual fan control not supported for GPU {} Fan {}. \
                        Excluding it from speed changes",
                        device.index, fan.index
                    );

                    fan.controllable = false;

                    continue;
                }
                Err(err) => {
                    warn!(
                        "Unable to set manual fan control policy for GPU {} Fan {}: {}",
                        device.index, fan.index, err
                    );

                    continue;
                }
            }

            if let Err(err) = backend.set_fan_speed(device.index, fan.index, new_speed) {
                warn!(
                    "Unable to set fan speed for GPU {} Fan {} to {}%: {}",
                    device.index, fan.index, new_speed, err
                );

                continue;
            }

            info!(
                "Updated GPU {} Fan {}: Temp={}°C, PrevSpeed={}%, NewSpeed={}%",
                device.index, fan.index, temp, fan.previous_speed, new_speed
            );

            fan.previous_speed = new_speed;
        }

        // The temperature baseline advances even if no fan changed
        device.previous_temperature = temp;
    }

    // Find the GPUs with fans and seed their states
    fn discover_devices(backend: &B) -> Result<Vec<DeviceState>, FanManagerError> {
        let device_count = backend
            .device_count()
            .map_err(FanManagerError::DeviceCount)?;

        if device_count == 0 {
            return Err(FanManagerError::NoDevices);
        }

        info!("Found {} GPU device(s)", device_count);

        let mut devices = Vec::new();

        for index in 0..device_count {
            let fan_count = match backend.fan_count(index) {
                Ok(count) => count,
                Err(err) => {
                    warn!(
                        "Unable to get fan count for GPU {}: {}. Skipping device",
                        index, err
                    );

                    continue;
                }
            };

            if fan_count == 0 {
                info!("GPU {} reports no controllable fans, skipping it", index);

                continue;
            }

            info!(
                "GPU {} has {} controllable fan(s), initializing state",
                index, fan_count
            );

            devices.push(Self::seed_device(backend, index, fan_count));
        }

        if devices.is_empty() {
            return Err(FanManagerError::NoControllableFans(device_count));
        }

        info!(
            "Device initialization complete, monitoring {} device(s)",
            devices.len()
        );

        Ok(devices)
    }

    // Read the initial temperature and fan speeds, unreadable values are seeded with 0
    fn seed_device(backend: &B, index: u32, fan_count: u32) -> DeviceState {
        let temp = backend.temperature(index).unwrap_or_else(|err| {
            warn!(
                "Failed to get initial temperature for GPU {}: {}. Using 0",
                index, err
            );

            0
        });

        let fans = (0..fan_count)
            .map(|fan| {
                let speed = backend.fan_speed(index, fan).unwrap_or_else(|err| {
                    warn!(
                        "Failed to get initial speed for GPU {} Fan {}: {}. Using 0",
                        index, fan, err
                    );

                    0
                });

                FanState::new(fan, speed)
            })
            .collect();

        let device = DeviceState::new(index, temp, fans);

        info!(
            "Initial state for GPU {}: Temp={}°C, Fan Speeds={:?}%",
            index,
            device.previous_temperature,
            device.fan_speeds()
        );

        device
    }
}

impl<B: GpuBackend> Drop for FanManager<B> {
    fn drop(&mut self) {
        self.restore_auto_control();
    }
}
