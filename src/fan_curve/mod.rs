use serde::{Deserialize, Serialize};

pub mod hysteresis_curve;

pub use hysteresis_curve::decide;

// One band of the fan curve, matching temperatures in (min, max]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureRange {
    // Exclusive lower bound
    pub min_temperature: i32,
    // Inclusive upper bound
    pub max_temperature: i32,

    // Target fan speed in percent
    pub fan_speed: u32,

    // Minimum Delta-T needed to restate the target of this band
    pub hysteresis: u32,
}

impl TemperatureRange {
    pub fn new(
        min_temperature: i32,
        max_temperature: i32,
        fan_speed: u32,
        hysteresis: u32,
    ) -> Self {
        Self {
            min_temperature,
            max_temperature,
            fan_speed,
            hysteresis,
        }
    }

    // Check if the temperature falls inside the band
    pub fn contains(&self, temp: i32) -> bool {
        temp > self.min_temperature && temp <= self.max_temperature
    }

    // A band with min >= max can never match any temperature
    pub fn is_empty(&self) -> bool {
        self.min_temperature >= self.max_temperature
    }
}

impl From<(i32, i32, u32, u32)> for TemperatureRange {
    fn from(value: (i32, i32, u32, u32)) -> Self {
        Self::new(value.0, value.1, value.2, value.3)
    }
}

/// Ordered list of temperature ranges.
///
/// The table is evaluated in the order it was loaded and the first
/// matching band wins, it doesn't need to be sorted or contiguous.
/// An empty table is valid and never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurveTable {
    ranges: Vec<TemperatureRange>,
}

impl CurveTable {
    pub fn new(ranges: Vec<TemperatureRange>) -> Self {
        Self { ranges }
    }

    // Return the first band containing the given temperature
    pub fn find_band(&self, temp: i32) -> Option<&TemperatureRange> {
        self.ranges.iter().find(|range| range.contains(temp))
    }

    pub fn ranges(&self) -> &[TemperatureRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<TemperatureRange> for CurveTable {
    fn from_iter<I: IntoIterator<Item = TemperatureRange>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
