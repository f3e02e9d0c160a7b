use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::model::constants::DEFAULT_DB_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum RunMode {
    /// Rate an event and fold it into the player store
    #[default]
    Event,
    /// Evaluate promotions against the store only
    Report,
    /// Rebuild every racer's weights and rating from their stored results
    FixWeights
}

#[derive(Parser, Clone, Debug)]
#[command(
    display_name = "WRS Processor",
    about = "Rates time trial events for the Weekly Race Series",
    long_about = "Reads an event submission file, builds the par curve, rates and places every \
    entry and folds the results into the player store"
)]
pub struct Args {
    /// Event submission file
    pub event_file: PathBuf,

    #[arg(short, long, env = "WRS_DATABASE", default_value = DEFAULT_DB_NAME, help = "Player store")]
    pub database: PathBuf,

    /// Where the statistics report goes. Overrides `STATFILE:` in the event file;
    /// printed to stdout when neither is set.
    #[arg(long, env = "WRS_STATS_FILE")]
    pub stats_file: Option<PathBuf>,

    /// Where the results report goes. Overrides `OUT:` in the event file.
    #[arg(long, env = "WRS_RESULTS_FILE")]
    pub results_file: Option<PathBuf>,

    /// Writes a JSON summary of the run to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Overrides the mode the event file asks for
    #[arg(short, long, value_enum)]
    pub mode: Option<RunMode>,

    /// Computes everything without rewriting the player store
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String
}
