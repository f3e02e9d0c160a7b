use std::{fmt::Write as _, sync::Once};

use tempfile::TempDir;
use wrs_processor::{model::structures::time_value::TimeValue, utils::test_utils::generate_lap_times};

static INIT: Once = Once::new();

/// Initialize test environment with RUST_LOG=WARN
pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("RUST_LOG", "warn");
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// An event file with one submission per racer, `player_1` onwards.
pub fn event_text(week: u32, status: char, count: usize, mean: i64) -> String {
    let mut text = format!("WEEK: {} EVENT_STATUS: {}\nCAR: Test Car\nTRACK: Test Track\n", week, status);
    for (i, millis) in generate_lap_times(count, mean, 2_500).into_iter().enumerate() {
        let _ = writeln!(
            text,
            "USER: user_{} PSN: player_{} TIME: {}",
            i + 1,
            i + 1,
            TimeValue::from_millis(millis)
        );
    }
    text
}

/// A fresh temporary directory, removed when the returned guard drops.
pub fn scratch_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("wrs-processor-{}-", name))
        .tempdir()
        .expect("Failed to create temporary directory")
}
