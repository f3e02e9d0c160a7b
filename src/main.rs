use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode
};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wrs_processor::{
    args::{Args, RunMode},
    database::{event_parser::parse_event, player_store},
    error::WrsError,
    model::wrs_model::WrsModel,
    report::{promotion_report, results_report, stats_report, RunSummary}
};

fn init_tracing(level: &str) {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

/// Writes a report to `path`, or to stdout when there is none.
fn emit(path: Option<&Path>, text: &str) -> Result<(), WrsError> {
    match path {
        Some(path) => {
            fs::write(path, text).map_err(|e| WrsError::io(path, e))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", text)
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), WrsError> {
    let players = player_store::load(&args.database)?;
    let text = fs::read_to_string(&args.event_file).map_err(|e| WrsError::io(&args.event_file, e))?;
    let parsed = parse_event(&text);

    let mode = args.mode.or(parsed.mode).unwrap_or_default();
    let stats_file = args.stats_file.clone().or(parsed.stats_file.map(PathBuf::from));
    let results_file = args.results_file.clone().or(parsed.results_file.map(PathBuf::from));
    info!("Running {:?} for {}", mode, args.event_file.display());

    let mut model = WrsModel::new(&players, parsed.config);

    match mode {
        RunMode::Event => {
            // A capacity error is logged by the model; what registered before it still runs.
            let rejected = model.register_submissions(&parsed.submissions).unwrap_or_default();
            if !rejected.is_empty() {
                warn!("{} submissions were not registered", rejected.len());
            }

            let outcome = model.process();
            emit(stats_file.as_deref(), &stats_report(&model.context))?;
            emit(results_file.as_deref(), &results_report(&model.context, &outcome))?;

            if !outcome.promotions.is_empty() {
                info!(
                    "{} promotions and {} rookie placements pending",
                    outcome.promotions.promotions.len(),
                    outcome.promotions.placements.len()
                );
            }
            if let Some(path) = &args.json {
                let json = RunSummary::new(&model.context, &outcome).to_json()?;
                fs::write(path, json).map_err(|e| WrsError::io(path, e))?;
                info!("Wrote run summary to {}", path.display());
            }
        }
        RunMode::Report => {
            let (report, _) = model.promote();
            emit(results_file.as_deref(), &promotion_report(&report))?;

            if !model.context.event.is_final() {
                info!("Event is provisional, player store left unchanged");
                return Ok(());
            }
        }
        RunMode::FixWeights => {
            model.rebuild_weights();
        }
    }

    if args.dry_run {
        info!("Dry run, player store left unchanged");
        return Ok(());
    }
    player_store::save(&args.database, model.rating_tracker.players())
        .map_err(WrsError::from)
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
