use serde::{Deserialize, Serialize};

/// Number of f32 lanes in one telemetry datagram.
pub const FIELD_COUNT: usize = 66;

/// Size in bytes of one telemetry datagram (little-endian f32 lanes).
pub const FRAME_BYTES: usize = FIELD_COUNT * 4;

// Lane layout is a contract with the telemetry source. Positions must be
// preserved field-for-field.
pub const LANE_TOTAL_TIME: usize = 0;
pub const LANE_RACE_PROGRESS: usize = 2;
pub const LANE_POS_Z: usize = 6;
pub const LANE_SPEED: usize = 7;
pub const LANE_THROTTLE: usize = 29;
pub const LANE_BRAKE: usize = 31;
pub const LANE_CLUTCH: usize = 32;
pub const LANE_GEAR: usize = 33;
pub const LANE_LAP_COMPLETE: usize = 59;
pub const LANE_TRACK_LENGTH: usize = 61;
pub const LANE_STAGE_TIME: usize = 62;
pub const LANE_MAX_RPM: usize = 63;
pub const LANE_IDLE_RPM: usize = 64;
pub const LANE_GEAR_COUNT: usize = 65;

pub type CarId = i64;
pub type TrackId = i64;

/// One game tick's numeric telemetry vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFrame {
    lanes: [f32; FIELD_COUNT],
}

impl TelemetryFrame {
    pub fn new(lanes: [f32; FIELD_COUNT]) -> Self {
        Self { lanes }
    }

    /// Decodes a little-endian f32 datagram. Short datagrams are rejected;
    /// trailing bytes beyond the known lanes are ignored.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < FRAME_BYTES {
            return None;
        }
        let mut lanes = [0.0f32; FIELD_COUNT];
        for (lane, chunk) in lanes.iter_mut().zip(payload.chunks_exact(4)) {
            *lane = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Some(Self { lanes })
    }

    pub fn lane(&self, index: usize) -> f32 {
        self.lanes[index]
    }

    /// An all-zero frame is the source's "no data" sentinel, not a live tick.
    pub fn is_live(&self) -> bool {
        self.lanes.iter().any(|v| *v != 0.0)
    }

    pub fn total_time(&self) -> f32 {
        self.lanes[LANE_TOTAL_TIME]
    }

    pub fn race_progress(&self) -> f32 {
        self.lanes[LANE_RACE_PROGRESS]
    }

    pub fn speed(&self) -> f32 {
        self.lanes[LANE_SPEED]
    }

    pub fn gear(&self) -> i32 {
        self.lanes[LANE_GEAR] as i32
    }

    pub fn lap_complete(&self) -> bool {
        self.lanes[LANE_LAP_COMPLETE] == 1.0
    }

    pub fn stage_time(&self) -> f32 {
        self.lanes[LANE_STAGE_TIME]
    }
}

/// Stage occupancy state. Owned exclusively by the stats processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Idle,
    InStage,
    JustFinished,
}

/// Identification outcome: either a single resolved identity or an ordered
/// set of ambiguous candidates. An empty set is legal and distinct from both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateSet<T> {
    Resolved(T),
    Ambiguous(Vec<T>),
}

impl<T: Copy + PartialEq> CandidateSet<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, CandidateSet::Resolved(_))
    }

    pub fn candidates(&self) -> &[T] {
        match self {
            CandidateSet::Resolved(value) => std::slice::from_ref(value),
            CandidateSet::Ambiguous(values) => values,
        }
    }
}

impl<T> Default for CandidateSet<T> {
    fn default() -> Self {
        CandidateSet::Ambiguous(Vec::new())
    }
}

/// Final record for one finished stage. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub car: CandidateSet<CarId>,
    pub track: CandidateSet<TrackId>,
    pub lap_time: f32,
    pub top_speed: f32,
}
