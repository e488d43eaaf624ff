use crate::types::{TelemetryFrame, LANE_BRAKE, LANE_CLUTCH, LANE_THROTTLE};

const CLUTCH_ENGAGED: f32 = 0.5;

/// Latest control-input snapshot plus whether the clutch was ever worked
/// this stage. H-pattern cars show clutch use on every shift, sequential
/// cars do not, which makes this a cheap disambiguation signal.
#[derive(Debug, Default)]
pub struct InputTracker {
    throttle: f32,
    brake: f32,
    clutch: f32,
    clutch_used: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, frame: &TelemetryFrame) {
        self.throttle = frame.lane(LANE_THROTTLE);
        self.brake = frame.lane(LANE_BRAKE);
        self.clutch = frame.lane(LANE_CLUTCH);
        if self.clutch >= CLUTCH_ENGAGED {
            self.clutch_used = true;
        }
    }

    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    pub fn brake(&self) -> f32 {
        self.brake
    }

    pub fn clutch(&self) -> f32 {
        self.clutch
    }

    pub fn clutch_used(&self) -> bool {
        self.clutch_used
    }

    pub fn reset(&mut self) {
        self.throttle = 0.0;
        self.brake = 0.0;
        self.clutch = 0.0;
        self.clutch_used = false;
    }
}
