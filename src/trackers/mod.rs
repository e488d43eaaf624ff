// Per-tick telemetry trackers. Each one consumes the raw frame, mutates only
// its own state and exposes a small queryable view.

mod gear_tracker;
mod input_tracker;
mod respawn_tracker;
mod speed_tracker;
mod time_tracker;

pub use gear_tracker::GearTracker;
pub use input_tracker::InputTracker;
pub use respawn_tracker::RespawnTracker;
pub use speed_tracker::SpeedTracker;
pub use time_tracker::TimeTracker;

use crate::types::TelemetryFrame;

/// Fans every frame out to the individual trackers and resets them as one
/// when stage recognition restarts.
#[derive(Debug, Default)]
pub struct TrackerSet {
    pub time: TimeTracker,
    pub respawn: RespawnTracker,
    pub speed: SpeedTracker,
    pub gear: GearTracker,
    pub input: InputTracker,
}

impl TrackerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, frame: &TelemetryFrame) {
        self.time.track(frame);
        self.respawn.track(frame);
        self.speed.track(frame);
        self.gear.track(frame);
        self.input.track(frame);
    }

    pub fn reset(&mut self) {
        self.time.reset();
        self.respawn.reset();
        self.speed.reset();
        self.gear.reset();
        self.input.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FIELD_COUNT, LANE_GEAR, LANE_SPEED, LANE_TOTAL_TIME};

    fn frame_with(lanes: &[(usize, f32)]) -> TelemetryFrame {
        let mut values = [0.0f32; FIELD_COUNT];
        for (index, value) in lanes {
            values[*index] = *value;
        }
        TelemetryFrame::new(values)
    }

    #[test]
    fn test_tracker_set_fans_out_and_resets_as_one() {
        let mut trackers = TrackerSet::new();
        trackers.track(&frame_with(&[
            (LANE_TOTAL_TIME, 10.0),
            (LANE_SPEED, 30.0),
            (LANE_GEAR, 3.0),
        ]));

        assert_eq!(trackers.speed.top_speed(), 30.0);
        assert_eq!(trackers.gear.gear(), 3);

        trackers.reset();
        assert_eq!(trackers.speed.top_speed(), 0.0);
        assert_eq!(trackers.time.time_delta(), 0.0);
    }
}
