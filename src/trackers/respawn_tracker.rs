use crate::types::TelemetryFrame;

// A manual restart places the car back at the start line, so race progress
// collapses into this window. Rolling backwards over the line instead drives
// progress negative, which is not a restart.
const RESTART_PROGRESS_WINDOW: f32 = 0.05;
// Minimum regression to count as a jump back rather than measurement jitter
// around the line.
const MIN_PROGRESS_REGRESSION: f32 = 0.01;

/// Detects the car being manually repositioned to the start line, as opposed
/// to a bare time regression (which the time tracker reports separately).
#[derive(Debug, Default)]
pub struct RespawnTracker {
    previous_progress: Option<f32>,
    restart: bool,
}

impl RespawnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, frame: &TelemetryFrame) {
        if !frame.is_live() {
            return;
        }
        let progress = frame.race_progress();
        if let Some(previous) = self.previous_progress {
            self.restart = (0.0..=RESTART_PROGRESS_WINDOW).contains(&progress)
                && previous > progress + MIN_PROGRESS_REGRESSION;
        }
        self.previous_progress = Some(progress);
    }

    pub fn is_restart(&self) -> bool {
        self.restart
    }

    pub fn reset(&mut self) {
        self.previous_progress = None;
        self.restart = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FIELD_COUNT, LANE_RACE_PROGRESS};

    fn frame_at(progress: f32) -> TelemetryFrame {
        let mut lanes = [0.0f32; FIELD_COUNT];
        lanes[LANE_RACE_PROGRESS] = progress;
        TelemetryFrame::new(lanes)
    }

    #[test]
    fn test_jump_back_to_start_line_is_a_restart() {
        let mut tracker = RespawnTracker::new();
        tracker.track(&frame_at(0.4));
        tracker.track(&frame_at(0.01));
        assert!(tracker.is_restart());
    }

    #[test]
    fn test_forward_progress_is_not_a_restart() {
        let mut tracker = RespawnTracker::new();
        tracker.track(&frame_at(0.4));
        tracker.track(&frame_at(0.41));
        assert!(!tracker.is_restart());
    }

    #[test]
    fn test_regression_short_of_the_start_line_is_not_a_restart() {
        // Rolling backwards mid-stage keeps progress well above the line.
        let mut tracker = RespawnTracker::new();
        tracker.track(&frame_at(0.4));
        tracker.track(&frame_at(0.38));
        assert!(!tracker.is_restart());
    }

    #[test]
    fn test_rolling_behind_the_start_line_is_not_a_restart() {
        let mut tracker = RespawnTracker::new();
        tracker.track(&frame_at(0.01));
        tracker.track(&frame_at(-0.2));
        assert!(!tracker.is_restart());
    }

    #[test]
    fn test_jitter_around_the_start_line_is_not_a_restart() {
        let mut tracker = RespawnTracker::new();
        tracker.track(&frame_at(0.015));
        tracker.track(&frame_at(0.01));
        assert!(!tracker.is_restart());
    }
}
