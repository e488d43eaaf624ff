use crate::trackers::{GearTracker, InputTracker};
use crate::types::CarId;
use std::collections::HashMap;
use tracing::debug;

/// Pattern matching against per-car signal signatures to break car
/// ambiguity immediately. Returning `None` is a normal outcome.
pub trait CarHeuristics {
    fn resolve(
        &self,
        candidates: &[CarId],
        gear: &GearTracker,
        input: &InputTracker,
    ) -> Option<CarId>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarSignature {
    pub gear_count: i32,
    pub manual_clutch: bool,
}

/// Resolves car ambiguity from how the driver shifted: cars with fewer
/// gears than the highest gear reached are ruled out, and clutch use
/// separates H-pattern cars from sequential ones.
pub struct GearShiftHeuristics {
    signatures: HashMap<CarId, CarSignature>,
}

impl GearShiftHeuristics {
    pub fn new(signatures: HashMap<CarId, CarSignature>) -> Self {
        Self { signatures }
    }
}

impl CarHeuristics for GearShiftHeuristics {
    fn resolve(
        &self,
        candidates: &[CarId],
        gear: &GearTracker,
        input: &InputTracker,
    ) -> Option<CarId> {
        let top_gear = gear.top_gear();

        let plausible: Vec<CarId> = candidates
            .iter()
            .copied()
            .filter(|car| {
                self.signatures
                    .get(car)
                    .is_some_and(|signature| signature.gear_count >= top_gear)
            })
            .collect();

        if let [winner] = plausible[..] {
            debug!("Gear-count signature singled out car {winner}");
            return Some(winner);
        }

        // Shift count tells us a shift happened at all; only then is clutch
        // use meaningful as a transmission signal.
        if gear.shift_count() == 0 {
            return None;
        }

        let by_clutch: Vec<CarId> = plausible
            .iter()
            .copied()
            .filter(|car| {
                self.signatures
                    .get(car)
                    .is_some_and(|signature| signature.manual_clutch == input.clutch_used())
            })
            .collect();

        match by_clutch[..] {
            [winner] => {
                debug!("Clutch signature singled out car {winner}");
                Some(winner)
            }
            _ => None,
        }
    }
}
