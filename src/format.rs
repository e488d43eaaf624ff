//! Display formatting for speeds and stage times. Pure functions, no state.

use crate::config::SpeedUnit;

const MPS_TO_KPH: f32 = 3.6;
const KPH_TO_MPH: f32 = 0.621371;

/// Converts a top speed in m/s (as delivered by the speed lane) into the
/// configured display unit, fixed to one decimal place.
pub fn format_top_speed(speed_mps: f32, unit: SpeedUnit) -> String {
    let kph = speed_mps * MPS_TO_KPH;
    let display = match unit {
        SpeedUnit::Kph => kph,
        SpeedUnit::Mph => kph * KPH_TO_MPH,
    };
    format!("{display:.1}")
}

pub fn format_lap_time(seconds: f64) -> String {
    format!("{seconds:.2}")
}

/// Renders a stage time as `MM:SS.mmm`, or `H:MM:SS.mmm` above one hour.
pub fn pretty_lap_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}.{ms:03}")
    } else {
        format!("{mins:02}:{secs:02}.{ms:03}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_speed_conversion() {
        assert_eq!(format_top_speed(33.28, SpeedUnit::Kph), "119.8");
        assert_eq!(format_top_speed(33.28, SpeedUnit::Mph), "74.4");
    }

    #[test]
    fn test_lap_time_conversion() {
        assert_eq!(format_lap_time(180.249), "180.25");
    }

    #[test]
    fn test_pretty_lap_time_conversion() {
        assert_eq!(pretty_lap_time(180.240), "03:00.240");
        assert_eq!(pretty_lap_time(3612.240), "1:00:12.240");
    }
}
