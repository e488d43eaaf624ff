use crate::types::{
    CandidateSet, CarId, StageResult, TelemetryFrame, TrackId, LANE_GEAR_COUNT, LANE_IDLE_RPM,
    LANE_MAX_RPM, LANE_POS_Z, LANE_TRACK_LENGTH,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const RPM_TOLERANCE: f32 = 1.0;
const TRACK_LENGTH_TOLERANCE: f32 = 0.5;
const START_Z_TOLERANCE: f32 = 10.0;

/// What a successful result write reports back: the new record plus the
/// previous best time for the same car/track pair, if one existed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBest {
    pub record_id: i64,
    pub previous_best: Option<f64>,
}

/// Persistence capability consumed by the core. Identification may be
/// ambiguous; evidence weights accumulate across process lifetimes.
pub trait Storage {
    fn identify_car(&self, frame: &TelemetryFrame) -> Result<CandidateSet<CarId>>;
    fn identify_track(&self, frame: &TelemetryFrame) -> Result<CandidateSet<TrackId>>;

    fn handle_car_updates(
        &mut self,
        candidates: &[CarId],
        timestamp: f64,
        track: &CandidateSet<TrackId>,
        weight: f64,
    ) -> Result<()>;

    fn handle_track_updates(
        &mut self,
        candidates: &[TrackId],
        timestamp: f64,
        car: &CandidateSet<CarId>,
        weight: f64,
    ) -> Result<()>;

    /// Persists a stage result. Returns `None` when nothing was written,
    /// e.g. the time did not improve on the stored best.
    fn record_results(&mut self, result: &StageResult, timestamp: f64)
        -> Result<Option<RecordedBest>>;

    fn car_name(&self, car: CarId) -> Option<String>;
    fn track_name(&self, track: TrackId) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarEntry {
    pub id: CarId,
    pub name: String,
    pub idle_rpm: f32,
    pub max_rpm: f32,
    pub gear_count: i32,
    #[serde(default)]
    pub manual_clutch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEntry {
    pub id: TrackId,
    pub name: String,
    pub length: f32,
    pub start_z: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Catalogue {
    pub cars: Vec<CarEntry>,
    pub tracks: Vec<TrackEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JournalLine {
    CarEvidence {
        timestamp: f64,
        candidates: Vec<CarId>,
        track: CandidateSet<TrackId>,
        weight: f64,
    },
    TrackEvidence {
        timestamp: f64,
        candidates: Vec<TrackId>,
        car: CandidateSet<CarId>,
        weight: f64,
    },
    Result {
        record_id: i64,
        timestamp: f64,
        result: StageResult,
    },
}

/// File-backed storage: a JSON catalogue of known cars and tracks plus an
/// append-only JSON-lines journal for evidence and results.
pub struct FileStorage {
    catalogue: Catalogue,
    journal_path: PathBuf,
}

impl FileStorage {
    pub fn open(catalogue_path: &Path, journal_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(catalogue_path)
            .with_context(|| format!("Failed to read catalogue {}", catalogue_path.display()))?;
        let catalogue: Catalogue =
            serde_json::from_str(&contents).context("Failed to parse catalogue")?;
        debug!(
            "Catalogue loaded: {} cars, {} tracks",
            catalogue.cars.len(),
            catalogue.tracks.len()
        );
        Ok(Self {
            catalogue,
            journal_path: journal_path.to_path_buf(),
        })
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    fn append(&mut self, line: &JournalLine) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_path)
            .with_context(|| format!("Failed to open journal {}", self.journal_path.display()))?;
        let json = serde_json::to_string(line)?;
        writeln!(file, "{json}").context("Failed to append to journal")?;
        Ok(())
    }

    fn journal_lines(&self) -> Result<Vec<JournalLine>> {
        if !self.journal_path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.journal_path)
            .with_context(|| format!("Failed to read journal {}", self.journal_path.display()))?;
        let mut lines = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            lines.push(serde_json::from_str(line).context("Corrupt journal line")?);
        }
        Ok(lines)
    }

    fn best_time_for(&self, car: CarId, track: TrackId) -> Result<Option<f64>> {
        let mut best: Option<f64> = None;
        for line in self.journal_lines()? {
            if let JournalLine::Result { result, .. } = line {
                let matches = result.car == CandidateSet::Resolved(car)
                    && result.track == CandidateSet::Resolved(track);
                if matches {
                    let time = f64::from(result.lap_time);
                    best = Some(best.map_or(time, |b: f64| b.min(time)));
                }
            }
        }
        Ok(best)
    }
}

impl Storage for FileStorage {
    fn identify_car(&self, frame: &TelemetryFrame) -> Result<CandidateSet<CarId>> {
        let idle_rpm = frame.lane(LANE_IDLE_RPM);
        let max_rpm = frame.lane(LANE_MAX_RPM);
        let gear_count = frame.lane(LANE_GEAR_COUNT) as i32;

        let matches: Vec<CarId> = self
            .catalogue
            .cars
            .iter()
            .filter(|car| {
                (car.idle_rpm - idle_rpm).abs() <= RPM_TOLERANCE
                    && (car.max_rpm - max_rpm).abs() <= RPM_TOLERANCE
                    && car.gear_count == gear_count
            })
            .map(|car| car.id)
            .collect();

        Ok(if let [id] = matches[..] {
            CandidateSet::Resolved(id)
        } else {
            CandidateSet::Ambiguous(matches)
        })
    }

    fn identify_track(&self, frame: &TelemetryFrame) -> Result<CandidateSet<TrackId>> {
        let length = frame.lane(LANE_TRACK_LENGTH);
        let start_z = frame.lane(LANE_POS_Z);

        let by_length: Vec<&TrackEntry> = self
            .catalogue
            .tracks
            .iter()
            .filter(|track| (track.length - length).abs() <= TRACK_LENGTH_TOLERANCE)
            .collect();

        // Several stages share a length; the start-line z position splits
        // forward and reverse runs of the same road.
        let by_start: Vec<TrackId> = by_length
            .iter()
            .filter(|track| (track.start_z - start_z).abs() <= START_Z_TOLERANCE)
            .map(|track| track.id)
            .collect();

        let candidates = if by_start.is_empty() {
            by_length.iter().map(|track| track.id).collect()
        } else {
            by_start
        };

        Ok(if let [id] = candidates[..] {
            CandidateSet::Resolved(id)
        } else {
            CandidateSet::Ambiguous(candidates)
        })
    }

    fn handle_car_updates(
        &mut self,
        candidates: &[CarId],
        timestamp: f64,
        track: &CandidateSet<TrackId>,
        weight: f64,
    ) -> Result<()> {
        self.append(&JournalLine::CarEvidence {
            timestamp,
            candidates: candidates.to_vec(),
            track: track.clone(),
            weight,
        })
    }

    fn handle_track_updates(
        &mut self,
        candidates: &[TrackId],
        timestamp: f64,
        car: &CandidateSet<CarId>,
        weight: f64,
    ) -> Result<()> {
        self.append(&JournalLine::TrackEvidence {
            timestamp,
            candidates: candidates.to_vec(),
            car: car.clone(),
            weight,
        })
    }

    fn record_results(
        &mut self,
        result: &StageResult,
        timestamp: f64,
    ) -> Result<Option<RecordedBest>> {
        let previous_best = match (&result.car, &result.track) {
            (CandidateSet::Resolved(car), CandidateSet::Resolved(track)) => {
                self.best_time_for(*car, *track)?
            }
            _ => None,
        };

        if let Some(best) = previous_best {
            if f64::from(result.lap_time) >= best {
                // Not an improvement; keep the stored best untouched.
                return Ok(None);
            }
        }

        let record_id = (timestamp * 1000.0) as i64;
        self.append(&JournalLine::Result {
            record_id,
            timestamp,
            result: result.clone(),
        })?;
        Ok(Some(RecordedBest {
            record_id,
            previous_best,
        }))
    }

    fn car_name(&self, car: CarId) -> Option<String> {
        self.catalogue
            .cars
            .iter()
            .find(|entry| entry.id == car)
            .map(|entry| entry.name.clone())
    }

    fn track_name(&self, track: TrackId) -> Option<String> {
        self.catalogue
            .tracks
            .iter()
            .find(|entry| entry.id == track)
            .map(|entry| entry.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FIELD_COUNT;
    use tempfile::tempdir;

    fn catalogue_json() -> &'static str {
        r#"{
            "cars": [
                {"id": 100, "name": "Lancia Delta", "idle_rpm": 1000.0, "max_rpm": 7500.0, "gear_count": 5, "manual_clutch": true},
                {"id": 200, "name": "Ford Focus", "idle_rpm": 1000.0, "max_rpm": 7500.0, "gear_count": 5},
                {"id": 300, "name": "Subaru Impreza", "idle_rpm": 900.0, "max_rpm": 6800.0, "gear_count": 6}
            ],
            "tracks": [
                {"id": 1000, "name": "Pant Mawr", "length": 4821.0, "start_z": 130.0},
                {"id": 1001, "name": "Pant Mawr Reverse", "length": 4821.0, "start_z": -370.0}
            ]
        }"#
    }

    fn storage(dir: &tempfile::TempDir) -> FileStorage {
        let catalogue_path = dir.path().join("catalogue.json");
        fs::write(&catalogue_path, catalogue_json()).unwrap();
        FileStorage::open(&catalogue_path, &dir.path().join("journal.jsonl")).unwrap()
    }

    fn frame_with(lanes: &[(usize, f32)]) -> TelemetryFrame {
        let mut values = [0.0f32; FIELD_COUNT];
        for (index, value) in lanes {
            values[*index] = *value;
        }
        TelemetryFrame::new(values)
    }

    #[test]
    fn test_identify_car_unique_and_ambiguous() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir);

        let unique = frame_with(&[
            (LANE_IDLE_RPM, 900.0),
            (LANE_MAX_RPM, 6800.0),
            (LANE_GEAR_COUNT, 6.0),
        ]);
        assert_eq!(
            storage.identify_car(&unique).unwrap(),
            CandidateSet::Resolved(300)
        );

        let shared = frame_with(&[
            (LANE_IDLE_RPM, 1000.0),
            (LANE_MAX_RPM, 7500.0),
            (LANE_GEAR_COUNT, 5.0),
        ]);
        assert_eq!(
            storage.identify_car(&shared).unwrap(),
            CandidateSet::Ambiguous(vec![100, 200])
        );

        let unknown = frame_with(&[(LANE_IDLE_RPM, 500.0)]);
        assert_eq!(
            storage.identify_car(&unknown).unwrap(),
            CandidateSet::Ambiguous(vec![])
        );
    }

    #[test]
    fn test_identify_track_splits_reverse_run_by_start_position() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir);

        let forward = frame_with(&[(LANE_TRACK_LENGTH, 4821.0), (LANE_POS_Z, 128.0)]);
        assert_eq!(
            storage.identify_track(&forward).unwrap(),
            CandidateSet::Resolved(1000)
        );

        // Start position matching neither run leaves both candidates.
        let elsewhere = frame_with(&[(LANE_TRACK_LENGTH, 4821.0), (LANE_POS_Z, 900.0)]);
        assert_eq!(
            storage.identify_track(&elsewhere).unwrap(),
            CandidateSet::Ambiguous(vec![1000, 1001])
        );
    }

    #[test]
    fn test_record_results_reports_previous_best_on_improvement() {
        let dir = tempdir().unwrap();
        let mut storage = storage(&dir);

        let first = StageResult {
            car: CandidateSet::Resolved(100),
            track: CandidateSet::Resolved(1000),
            lap_time: 111.2,
            top_speed: 33.0,
        };
        let recorded = storage.record_results(&first, 1.0).unwrap().unwrap();
        assert_eq!(recorded.previous_best, None);

        let improved = StageResult {
            lap_time: 100.2,
            ..first.clone()
        };
        let recorded = storage.record_results(&improved, 2.0).unwrap().unwrap();
        assert_eq!(recorded.previous_best, Some(f64::from(111.2f32)));

        let slower = StageResult {
            lap_time: 140.0,
            ..first
        };
        assert!(storage.record_results(&slower, 3.0).unwrap().is_none());
    }

    #[test]
    fn test_evidence_lines_round_trip_through_journal() {
        let dir = tempdir().unwrap();
        let mut storage = storage(&dir);

        storage
            .handle_car_updates(&[100, 200], 42.0, &CandidateSet::Resolved(1000), 0.7)
            .unwrap();
        storage
            .handle_track_updates(&[], 43.0, &CandidateSet::Resolved(100), 0.7)
            .unwrap();

        let lines = storage.journal_lines().unwrap();
        assert_eq!(lines.len(), 2);
        match &lines[0] {
            JournalLine::CarEvidence {
                candidates, weight, ..
            } => {
                assert_eq!(candidates, &vec![100, 200]);
                assert_eq!(*weight, 0.7);
            }
            other => panic!("unexpected journal line {other:?}"),
        }
    }
}
