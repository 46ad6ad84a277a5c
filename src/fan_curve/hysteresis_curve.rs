use crate::fan_curve::CurveTable;

// Return the fan speed for the current temperature.
//
// The first band containing the temperature decides the result:
// its target speed is returned when the Delta-T from the previous
// reading reaches the band hysteresis, or when the previous speed
// doesn't match the target. Otherwise the previous speed is kept.
// A temperature outside every band holds the previous speed.
pub fn decide(
    current_temp: i32,
    prev_temp: i32,
    prev_speed: u32,
    table: &CurveTable,
) -> u32 {
    let Some(range) = table.find_band(current_temp) else {
        return prev_speed;
    };

    let delta = current_temp.abs_diff(prev_temp);

    if delta >= range.hysteresis || prev_speed != range.fan_speed {
        range.fan_speed
    } else {
        prev_speed
    }
}
