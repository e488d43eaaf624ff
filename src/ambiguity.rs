use crate::heuristics::CarHeuristics;
use crate::storage::Storage;
use crate::trackers::{GearTracker, InputTracker};
use crate::types::{CandidateSet, CarId, TrackId};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Online disambiguation engine. Ambiguity is resolved immediately when the
/// heuristics find a winner; otherwise the candidate set is recorded as
/// weighted evidence and returned unchanged, and accumulated weights tip the
/// balance in storage across sessions.
pub struct AmbiguousResultHandler {
    seed: u64,
    weight: f64,
    heuristics_activated: bool,
    heuristics: Box<dyn CarHeuristics>,
}

impl AmbiguousResultHandler {
    /// The seed is drawn fresh per instance so that repeated ambiguous
    /// sessions do not all reinforce the same stored weight.
    pub fn new(heuristics_activated: bool, heuristics: Box<dyn CarHeuristics>) -> Self {
        let seed: u64 = rand::random();
        let weight = StdRng::seed_from_u64(seed).gen_range(0.01..1.0);
        Self {
            seed,
            weight,
            heuristics_activated,
            heuristics,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn handle_ambiguous_cars(
        &self,
        storage: &mut dyn Storage,
        timestamp: f64,
        cars: &CandidateSet<CarId>,
        track: &CandidateSet<TrackId>,
        gear: &GearTracker,
        input: &InputTracker,
    ) -> Result<CandidateSet<CarId>> {
        let candidates = match cars {
            // Unambiguous results never touch storage through this path.
            CandidateSet::Resolved(_) => return Ok(cars.clone()),
            CandidateSet::Ambiguous(candidates) => candidates,
        };

        if self.heuristics_activated && !candidates.is_empty() {
            if let Some(winner) = self.heuristics.resolve(candidates, gear, input) {
                info!("Heuristics resolved ambiguous car to {winner}");
                let remaining: Vec<CarId> = candidates
                    .iter()
                    .copied()
                    .filter(|candidate| *candidate != winner)
                    .collect();
                storage.handle_car_updates(&remaining, timestamp, track, self.weight)?;
                return Ok(CandidateSet::Resolved(winner));
            }
        }

        debug!(
            "Recording {} ambiguous car candidate(s) for later convergence",
            candidates.len()
        );
        storage.handle_car_updates(candidates, timestamp, track, self.weight)?;
        Ok(cars.clone())
    }

    pub fn handle_ambiguous_tracks(
        &self,
        storage: &mut dyn Storage,
        timestamp: f64,
        tracks: &CandidateSet<TrackId>,
        car: &CandidateSet<CarId>,
    ) -> Result<CandidateSet<TrackId>> {
        let candidates = match tracks {
            CandidateSet::Resolved(_) => return Ok(tracks.clone()),
            CandidateSet::Ambiguous(candidates) => candidates,
        };

        debug!(
            "Recording {} ambiguous track candidate(s) for later convergence",
            candidates.len()
        );
        storage.handle_track_updates(candidates, timestamp, car, self.weight)?;
        Ok(tracks.clone())
    }
}
