// Per fan state tracked across polling cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanState {
    pub index: u32,

    // Last speed successfully applied, or read at startup
    pub previous_speed: u32,

    // Set once the fan policy was switched to manual by the daemon,
    // such fans are handed back to the driver on shutdown
    pub manual_mode: bool,

    // Cleared when the fan doesn't support manual control,
    // the fan is still evaluated but never written to
    pub controllable: bool,
}

// Per device state, the temperature history is shared
// by all of the fans of the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub index: u32,

    pub previous_temperature: i32,

    pub fans: Vec<FanState>,
}

impl FanState {
    pub fn new(index: u32, previous_speed: u32) -> Self {
        Self {
            index,
            previous_speed,
            manual_mode: false,
            controllable: true,
        }
    }
}

impl DeviceState {
    pub fn new(index: u32, previous_temperature: i32, fans: Vec<FanState>) -> Self {
        Self {
            index,
            previous_temperature,
            fans,
        }
    }

    // Return the tracked speed of every fan, in fan order
    pub fn fan_speeds(&self) -> Vec<u32> {
        self.fans.iter().map(|fan| fan.previous_speed).collect()
    }
}
