mod ambiguity;
mod config;
mod format;
mod heuristics;
mod presentation;
mod receiver;
mod stats_processor;
mod storage;
mod trackers;
mod types;

use ambiguity::AmbiguousResultHandler;
use anyhow::{Context, Result};
use config::Config;
use heuristics::{CarSignature, GearShiftHeuristics};
use presentation::ConsolePresentation;
use receiver::Receiver;
use stats_processor::StatsProcessor;
use std::collections::HashMap;
use std::path::Path;
use storage::FileStorage;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config.yml";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(CONFIG_PATH)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.level).context("Invalid logging.level")?,
        )
        .init();

    info!("🏁 Rally Time Recorder starting");

    let storage = FileStorage::open(
        Path::new(&config.storage.catalogue_path),
        Path::new(&config.storage.journal_path),
    )?;
    let signatures: HashMap<_, _> = storage
        .catalogue()
        .cars
        .iter()
        .map(|car| {
            (
                car.id,
                CarSignature {
                    gear_count: car.gear_count,
                    manual_clutch: car.manual_clutch,
                },
            )
        })
        .collect();
    let handler = AmbiguousResultHandler::new(
        config.heuristics_activated,
        Box::new(GearShiftHeuristics::new(signatures)),
    );
    debug!("Session ambiguity seed {}", handler.seed());

    let mut receiver = Receiver::bind(&config.telemetry.bind).await?;
    let mut processor =
        StatsProcessor::new(config, handler, storage, ConsolePresentation::new());

    loop {
        // Receiver failure is unrecoverable here; reconnecting is the
        // operator's call.
        let frame = receiver.next_frame().await?;
        if let Err(error) = processor.handle_frame(&frame) {
            // Stage state is already settled; keep ingesting.
            error!("Failed to process frame: {error:#}");
        }
    }
}
