use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fan_curve::CurveTable;

// Update interval used when the configured one is not positive
pub const DEFAULT_TIME_TO_UPDATE: u64 = 5;

const MAX_FAN_SPEED: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open Json configuration file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse Json configuration file")]
    Parse(#[from] serde_json::Error),
    #[error("Temperature range {index} has a fan speed of {speed}%, the maximum is 100%")]
    InvalidFanSpeed { index: usize, speed: u32 },
}

// Daemon Json configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // Update interval in seconds
    #[serde(default)]
    pub time_to_update: i64,

    #[serde(default)]
    pub temperature_ranges: CurveTable,
}

impl Config {
    // Load and validate the configuration file at the given path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Parsing config file at: {:?}", path);

        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_reader(BufReader::new(file))?;

        info!(
            "Configuration loaded: update interval {:?}, {} temperature range(s)",
            config.update_interval(),
            config.temperature_ranges.len()
        );

        Ok(config)
    }

    // Parse and validate a Json configuration
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_reader(reader)?;

        config.validate()?;

        Ok(config)
    }

    // Return the polling interval, falling back to the default
    // when the configured value is not positive
    pub fn update_interval(&self) -> Duration {
        match u64::try_from(self.time_to_update) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(DEFAULT_TIME_TO_UPDATE),
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.time_to_update <= 0 {
            warn!(
                "time_to_update ({}) is invalid, defaulting to {} seconds",
                self.time_to_update, DEFAULT_TIME_TO_UPDATE
            );

            self.time_to_update = DEFAULT_TIME_TO_UPDATE as i64;
        }

        for (index, range) in self.temperature_ranges.ranges().iter().enumerate()
        {
            if range.fan_speed > MAX_FAN_SPEED {
                return Err(ConfigError::InvalidFanSpeed {
                    index,
                    speed: range.fan_speed,
                });
            }

            // Kept in place so the position of the other ranges is unchanged
            if range.is_empty() {
                warn!(
                    "Temperature range {} ({}, {}] can never match",
                    index, range.min_temperature, range.max_temperature
                );
            }
        }

        if self.temperature_ranges.is_empty() {
            warn!("No temperature ranges configured, fan speeds will not change");
        }

        Ok(())
    }
}
