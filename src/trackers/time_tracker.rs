use crate::types::TelemetryFrame;

/// Tracks the signed delta of the stage time lane between consecutive live
/// frames. A negative delta indicates the stage clock ran backwards, which
/// the stats processor treats as a reset unless a respawn explains it.
#[derive(Debug, Default)]
pub struct TimeTracker {
    previous_time: Option<f32>,
    delta: f32,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, frame: &TelemetryFrame) {
        // Sentinel frames are not live ticks; computing a delta against one
        // would fabricate a reset.
        if !frame.is_live() {
            return;
        }
        let time = frame.total_time();
        if let Some(previous) = self.previous_time {
            self.delta = time - previous;
        }
        self.previous_time = Some(time);
    }

    pub fn time_delta(&self) -> f32 {
        self.delta
    }

    pub fn reset(&mut self) {
        self.previous_time = None;
        self.delta = 0.0;
    }
}
