use crate::types::TelemetryFrame;

/// Retains the maximum speed (m/s, straight off the speed lane) observed
/// since the last reset. Display conversion happens in `format`.
#[derive(Debug, Default)]
pub struct SpeedTracker {
    top_speed: f32,
}

impl SpeedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, frame: &TelemetryFrame) {
        let speed = frame.speed();
        if speed > self.top_speed {
            self.top_speed = speed;
        }
    }

    pub fn top_speed(&self) -> f32 {
        self.top_speed
    }

    pub fn reset(&mut self) {
        self.top_speed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FIELD_COUNT, LANE_SPEED};

    fn frame_at(speed: f32) -> TelemetryFrame {
        let mut lanes = [0.0f32; FIELD_COUNT];
        lanes[LANE_SPEED] = speed;
        TelemetryFrame::new(lanes)
    }

    #[test]
    fn test_retains_maximum_across_frames() {
        let mut tracker = SpeedTracker::new();
        tracker.track(&frame_at(20.0));
        tracker.track(&frame_at(33.28));
        tracker.track(&frame_at(25.0));
        assert_eq!(tracker.top_speed(), 33.28);
    }

    #[test]
    fn test_reset_clears_top_speed() {
        let mut tracker = SpeedTracker::new();
        tracker.track(&frame_at(40.0));
        tracker.reset();
        assert_eq!(tracker.top_speed(), 0.0);
    }
}
