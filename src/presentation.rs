use crate::format::{format_lap_time, pretty_lap_time};
use crate::types::{CandidateSet, CarId, TrackId};
use std::fmt::Display;
use tracing::info;

/// Reporting capability. Nothing the core consumes comes back out of it.
pub trait Presentation {
    fn log_results(
        &self,
        lap_time: f64,
        car: &CandidateSet<CarId>,
        track: &CandidateSet<TrackId>,
        previous_best: Option<f64>,
    );

    /// One-time hint on stage entry, gated by configuration.
    fn show_car_control_information(&self, car: &CandidateSet<CarId>);
}

#[derive(Debug, Default)]
pub struct ConsolePresentation;

impl ConsolePresentation {
    pub fn new() -> Self {
        Self
    }
}

impl Presentation for ConsolePresentation {
    fn log_results(
        &self,
        lap_time: f64,
        car: &CandidateSet<CarId>,
        track: &CandidateSet<TrackId>,
        previous_best: Option<f64>,
    ) {
        info!(
            "Stage time {} ({}) for car {} on track {}",
            pretty_lap_time(lap_time),
            format_lap_time(lap_time),
            describe(car),
            describe(track)
        );
        if let Some(best) = previous_best {
            if lap_time < best {
                info!(
                    "New personal best, {} faster than {}",
                    format_lap_time(best - lap_time),
                    pretty_lap_time(best)
                );
            }
        }
    }

    fn show_car_control_information(&self, car: &CandidateSet<CarId>) {
        match car {
            CandidateSet::Resolved(id) => info!("Car {id}: check control scheme before launch"),
            CandidateSet::Ambiguous(_) => {
                info!("Car not uniquely identified yet, control hints unavailable")
            }
        }
    }
}

/// Operator-facing rendering of an identification outcome.
fn describe<T: Display>(set: &CandidateSet<T>) -> String {
    match set {
        CandidateSet::Resolved(id) => id.to_string(),
        CandidateSet::Ambiguous(ids) if ids.is_empty() => "unknown".into(),
        CandidateSet::Ambiguous(ids) => {
            let listed: Vec<String> = ids.iter().map(ToString::to_string).collect();
            format!("one of [{}]", listed.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_renders_each_identification_outcome() {
        assert_eq!(describe(&CandidateSet::<CarId>::Resolved(100)), "100");
        assert_eq!(
            describe(&CandidateSet::<CarId>::Ambiguous(vec![100, 200])),
            "one of [100, 200]"
        );
        assert_eq!(describe(&CandidateSet::<CarId>::Ambiguous(vec![])), "unknown");
    }
}
