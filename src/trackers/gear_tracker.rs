use crate::types::TelemetryFrame;

/// Snapshot of gear usage, kept as a disambiguation signal: the latest gear,
/// the highest forward gear reached and the number of shifts this stage.
/// A shift is a change between two forward gears; engaging 1st from neutral
/// is launching, not shifting.
#[derive(Debug, Default)]
pub struct GearTracker {
    gear: i32,
    top_gear: i32,
    last_forward_gear: Option<i32>,
    shift_count: u32,
}

impl GearTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, frame: &TelemetryFrame) {
        let gear = frame.gear();
        self.gear = gear;
        if gear > 0 {
            if let Some(previous) = self.last_forward_gear {
                if previous != gear {
                    self.shift_count += 1;
                }
            }
            self.last_forward_gear = Some(gear);
        }
        if gear > self.top_gear {
            self.top_gear = gear;
        }
    }

    pub fn gear(&self) -> i32 {
        self.gear
    }

    pub fn top_gear(&self) -> i32 {
        self.top_gear
    }

    pub fn shift_count(&self) -> u32 {
        self.shift_count
    }

    pub fn reset(&mut self) {
        self.gear = 0;
        self.top_gear = 0;
        self.last_forward_gear = None;
        self.shift_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FIELD_COUNT, LANE_GEAR};

    fn frame_in_gear(gear: f32) -> TelemetryFrame {
        let mut lanes = [0.0f32; FIELD_COUNT];
        lanes[LANE_GEAR] = gear;
        TelemetryFrame::new(lanes)
    }

    #[test]
    fn test_tracks_top_gear_and_shifts() {
        let mut tracker = GearTracker::new();
        tracker.track(&frame_in_gear(1.0));
        tracker.track(&frame_in_gear(2.0));
        tracker.track(&frame_in_gear(3.0));
        tracker.track(&frame_in_gear(2.0));

        assert_eq!(tracker.gear(), 2);
        assert_eq!(tracker.top_gear(), 3);
        assert_eq!(tracker.shift_count(), 3);
    }

    #[test]
    fn test_engaging_first_gear_is_not_a_shift() {
        let mut tracker = GearTracker::new();
        tracker.track(&frame_in_gear(0.0));
        tracker.track(&frame_in_gear(1.0));
        assert_eq!(tracker.shift_count(), 0);
    }

    #[test]
    fn test_shift_through_neutral_counts_once() {
        // Clutch dips can surface as a transient neutral between two
        // forward gears; that is still one shift.
        let mut tracker = GearTracker::new();
        tracker.track(&frame_in_gear(1.0));
        tracker.track(&frame_in_gear(0.0));
        tracker.track(&frame_in_gear(2.0));
        assert_eq!(tracker.shift_count(), 1);
    }
}
