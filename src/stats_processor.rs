use crate::ambiguity::AmbiguousResultHandler;
use crate::config::Config;
use crate::format::{format_top_speed, pretty_lap_time};
use crate::presentation::Presentation;
use crate::storage::Storage;
use crate::trackers::{GearTracker, InputTracker, TrackerSet};
use crate::types::{CandidateSet, CarId, StageResult, StageState, TelemetryFrame, TrackId};
use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

// Some editions never raise the lap-complete flag in time trial; race
// progress at or above this threshold is the fallback completion signal.
const RACE_COMPLETE_THRESHOLD: f32 = 0.999;

/// Consumes the telemetry stream one frame at a time, infers stage
/// start/finish/abort transitions and assembles the final result record.
pub struct StatsProcessor<S: Storage, P: Presentation> {
    config: Config,
    trackers: TrackerSet,
    state: StageState,
    car: CandidateSet<CarId>,
    track: CandidateSet<TrackId>,
    ambiguity: AmbiguousResultHandler,
    storage: S,
    presentation: P,
}

impl<S: Storage, P: Presentation> StatsProcessor<S, P> {
    pub fn new(
        config: Config,
        ambiguity: AmbiguousResultHandler,
        storage: S,
        presentation: P,
    ) -> Self {
        Self {
            config,
            trackers: TrackerSet::new(),
            state: StageState::Idle,
            car: CandidateSet::default(),
            track: CandidateSet::default(),
            ambiguity,
            storage,
            presentation,
        }
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    /// Processes one tick. Storage failures propagate after stage state has
    /// already been settled, so the next frame is handled from a clean slate.
    pub fn handle_frame(&mut self, frame: &TelemetryFrame) -> Result<()> {
        if frame.is_live() {
            self.trackers.track(frame);
        }

        let aborted = self.stage_aborted();
        let finishing = frame.lap_complete() || frame.race_progress() >= RACE_COMPLETE_THRESHOLD;

        if aborted {
            debug!(
                "Stage aborted (time delta {:.3}, restart {})",
                self.trackers.time.time_delta(),
                self.trackers.respawn.is_restart()
            );
            self.reset_recognition();
            return Ok(());
        }

        match self.state {
            StageState::InStage if finishing => self.finish_stage(frame),
            StageState::InStage => {
                // Covers the behind-start-line transient as well: negative
                // progress while in stage is a legitimate silent no-op.
                Ok(())
            }
            StageState::Idle | StageState::JustFinished => {
                if finishing {
                    // The completion signal lingers after a finish; never
                    // treat it as a fresh stage.
                    return Ok(());
                }
                if frame.is_live() {
                    self.start_stage(frame)
                } else {
                    if self.state == StageState::JustFinished {
                        self.state = StageState::Idle;
                    }
                    Ok(())
                }
            }
        }
    }

    /// A stage is aborted on a manual restart, or on a time regression that
    /// no restart explains. Forward time without a restart never aborts.
    fn stage_aborted(&self) -> bool {
        self.trackers.respawn.is_restart() || self.trackers.time.time_delta() < 0.0
    }

    fn reset_recognition(&mut self) {
        self.trackers.reset();
        self.car = CandidateSet::default();
        self.track = CandidateSet::default();
        self.state = StageState::Idle;
    }

    fn start_stage(&mut self, frame: &TelemetryFrame) -> Result<()> {
        // Identify before committing the state change: a storage failure
        // here leaves the machine idle, and the next frame retries entry.
        let car = self.storage.identify_car(frame)?;
        let track = self.storage.identify_track(frame)?;

        self.state = StageState::InStage;
        info!(
            "Stage started (progress {:.3})",
            frame.race_progress()
        );
        self.car = car;
        self.track = track;
        self.log_car(&self.car);
        self.log_track(&self.track);

        if self.config.show_car_controls {
            self.presentation.show_car_control_information(&self.car);
        }
        Ok(())
    }

    fn finish_stage(&mut self, frame: &TelemetryFrame) -> Result<()> {
        let lap_time = f64::from(frame.stage_time());
        let top_speed = self.trackers.speed.top_speed();
        let gear = std::mem::take(&mut self.trackers.gear);
        let input = std::mem::take(&mut self.trackers.input);
        let car = std::mem::take(&mut self.car);
        let track = std::mem::take(&mut self.track);

        self.reset_recognition();
        self.state = StageState::JustFinished;
        info!("Stage finished in {}", pretty_lap_time(lap_time));
        debug!(
            "Controls at finish: throttle {:.2}, brake {:.2}, clutch {:.2}, gear {}",
            input.throttle(),
            input.brake(),
            input.clutch(),
            gear.gear()
        );

        self.assemble_result(frame, car, track, lap_time, top_speed, &gear, &input)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble_result(
        &mut self,
        frame: &TelemetryFrame,
        car: CandidateSet<CarId>,
        track: CandidateSet<TrackId>,
        lap_time: f64,
        top_speed: f32,
        gear: &GearTracker,
        input: &InputTracker,
    ) -> Result<()> {
        // Identification normally happened on stage entry; recover here if
        // this occupancy never got one.
        let car = if car.candidates().is_empty() && frame.is_live() {
            self.storage.identify_car(frame)?
        } else {
            car
        };
        let track = if track.candidates().is_empty() && frame.is_live() {
            self.storage.identify_track(frame)?
        } else {
            track
        };

        let timestamp = unix_timestamp();
        let resolved_car = self.ambiguity.handle_ambiguous_cars(
            &mut self.storage,
            timestamp,
            &car,
            &track,
            gear,
            input,
        )?;
        let resolved_track =
            self.ambiguity
                .handle_ambiguous_tracks(&mut self.storage, timestamp, &track, &resolved_car)?;

        self.log_car(&resolved_car);
        self.log_track(&resolved_track);

        let result = StageResult {
            car: resolved_car,
            track: resolved_track,
            lap_time: lap_time as f32,
            top_speed,
        };

        let recorded = self.storage.record_results(&result, timestamp)?;
        info!(
            "Top speed {}",
            format_top_speed(top_speed, self.config.speed_unit)
        );
        let previous_best = recorded.and_then(|best| best.previous_best);
        self.presentation
            .log_results(lap_time, &result.car, &result.track, previous_best);
        Ok(())
    }

    fn log_car(&self, car: &CandidateSet<CarId>) {
        match car {
            CandidateSet::Resolved(id) => match self.storage.car_name(*id) {
                Some(name) => info!("Car: {name}"),
                None => info!("Car id {id} not in catalogue"),
            },
            CandidateSet::Ambiguous(candidates) => {
                warn!("Car not uniquely identified ({} candidates)", candidates.len())
            }
        }
    }

    fn log_track(&self, track: &CandidateSet<TrackId>) {
        match track {
            CandidateSet::Resolved(id) => match self.storage.track_name(*id) {
                Some(name) => info!("Track: {name}"),
                None => info!("Track id {id} not in catalogue"),
            },
            CandidateSet::Ambiguous(candidates) => {
                warn!(
                    "Track not uniquely identified ({} candidates)",
                    candidates.len()
                )
            }
        }
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
