use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{
    constants::DIV_COUNT,
    context::{EntryFilter, EventContext},
    db_structs::OverallStat,
    structures::time_value::TimeValue
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("no entries found")]
    NoEntries,
    #[error("no eligible entries found")]
    NoEligibleEntries
}

/// Population standard deviation in seconds around `mean`. Zero for an empty set.
pub fn std_dev(times: &[TimeValue], mean: TimeValue) -> f64 {
    if times.is_empty() {
        return 0.0;
    }

    let mean = mean.as_secs_f64();
    let variance = times
        .iter()
        .map(|t| {
            let diff = mean - t.as_secs_f64();
            diff * diff
        })
        .sum::<f64>()
        / times.len() as f64;

    variance.sqrt()
}

/// Rounded mean and deviation of a set of times, `None` when it is empty.
pub fn mean_and_std_dev(times: &[TimeValue]) -> Option<(TimeValue, f64)> {
    let mean = TimeValue::rounded_mean(times.iter().copied())?;
    Some((mean, std_dev(times, mean)))
}

/// Overall and quality statistics over the eligible entries.
///
/// The quality subset is every eligible time at or below the overall mean.
/// Expects entries already sorted by time.
pub fn collate(ctx: &mut EventContext) -> Result<(), StatsError> {
    if ctx.entries.is_empty() {
        warn!("No entries found, skipping statistics");
        return Err(StatsError::NoEntries);
    }

    let times: Vec<TimeValue> = ctx.select(EntryFilter::eligible()).map(|e| e.time).collect();
    let Some((mean, deviation)) = mean_and_std_dev(&times) else {
        warn!("No eligible entries found, skipping statistics");
        return Err(StatsError::NoEligibleEntries);
    };

    let quality: Vec<TimeValue> = times.iter().copied().filter(|t| *t <= mean).collect();
    let (quality_mean, quality_std_dev) = mean_and_std_dev(&quality).unwrap_or((TimeValue::ZERO, 0.0));

    ctx.overall = OverallStat {
        count: times.len() as u32,
        mean,
        std_dev: deviation,
        quality_count: quality.len() as u32,
        quality_mean,
        quality_std_dev,
        handicap_delta: 0.0
    };

    debug!(
        "Collated {} entries: mean {} (sd {:.3}), quality mean {} (sd {:.3})",
        ctx.overall.count, mean, deviation, quality_mean, quality_std_dev
    );

    Ok(())
}

/// Per-division count, mean, deviation and average handicap delta over the
/// eligible entries of each division. Also sets the overall average delta.
pub fn division_statistics(ctx: &mut EventContext) {
    let mut delta_total = 0.0;

    for division in 1..=DIV_COUNT {
        let (times, deltas): (Vec<TimeValue>, Vec<f64>) = ctx
            .select(EntryFilter::division(division))
            .map(|e| (e.time, e.handicap_delta))
            .unzip();

        let stat = &mut ctx.divisions[division as usize];
        stat.count = times.len() as u32;

        match mean_and_std_dev(&times) {
            Some((mean, deviation)) => {
                let delta_sum: f64 = deltas.iter().sum();
                delta_total += delta_sum;
                stat.mean = mean;
                stat.std_dev = deviation;
                stat.handicap_delta = delta_sum / stat.count as f64;
            }
            None => {
                stat.mean = TimeValue::ZERO;
                stat.std_dev = 0.0;
                stat.handicap_delta = 0.0;
            }
        }
    }

    ctx.overall.handicap_delta = match ctx.overall.count {
        0 => 0.0,
        count => delta_total / count as f64
    };
}

/// Deviation expressed per minute of mean lap time, used by the reports.
pub fn std_dev_per_minute(std_dev: f64, mean: TimeValue) -> f64 {
    let minutes = mean.as_secs_f64() / 60.0;
    if minutes > 0.0 {
        std_dev / minutes
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{collate, division_statistics, mean_and_std_dev, std_dev, StatsError};
    use crate::{
        model::{
            context::EventContext,
            db_structs::EventConfig,
            structures::{disqualification::Disqualification, time_value::TimeValue}
        },
        utils::test_utils::{generate_context, generate_entry}
    };
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_std_dev_is_population() {
        let times = [TimeValue::from_millis(1000), TimeValue::from_millis(3000)];
        assert_abs_diff_eq!(std_dev(&times, TimeValue::from_millis(2000)), 1.0);
        assert_abs_diff_eq!(std_dev(&[], TimeValue::ZERO), 0.0);
    }

    #[test]
    fn test_mean_rounds_half_up() {
        let times = [TimeValue::from_millis(1), TimeValue::from_millis(2)];
        let (mean, _) = mean_and_std_dev(&times).unwrap();
        assert_eq!(mean.total_millis(), 2);
    }

    #[test]
    fn test_collate_quality_subset() {
        let mut ctx = generate_context(&[60_000, 61_000, 62_000, 67_000]);
        collate(&mut ctx).unwrap();

        assert_eq!(ctx.overall.count, 4);
        assert_eq!(ctx.overall.mean.total_millis(), 62_500);
        assert_eq!(ctx.overall.quality_count, 3);
        assert_eq!(ctx.overall.quality_mean.total_millis(), 61_000);
        assert_abs_diff_eq!(ctx.overall.quality_std_dev, (2.0f64 / 3.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_collate_ignores_disqualified() {
        let mut ctx = generate_context(&[60_000, 62_000]);
        let mut dq = generate_entry(9, 1_000);
        dq.disqualification = Disqualification::NoReplay;
        ctx.entries.insert(0, dq);
        collate(&mut ctx).unwrap();

        assert_eq!(ctx.overall.count, 2);
        assert_eq!(ctx.overall.mean.total_millis(), 61_000);
    }

    #[test]
    fn test_collate_degenerate_sets() {
        let mut empty = EventContext::new(EventConfig::default());
        assert_eq!(collate(&mut empty), Err(StatsError::NoEntries));

        let mut all_dq = generate_context(&[60_000]);
        all_dq.entries[0].disqualification = Disqualification::Contact;
        assert_eq!(collate(&mut all_dq), Err(StatsError::NoEligibleEntries));
        assert_eq!(all_dq.overall.count, 0);
    }

    #[test]
    fn test_division_statistics() {
        let mut ctx = generate_context(&[60_000, 61_000, 70_000]);
        ctx.entries[0].provisional_division = 1;
        ctx.entries[0].handicap_delta = 0.2;
        ctx.entries[1].provisional_division = 1;
        ctx.entries[1].handicap_delta = -0.1;
        ctx.entries[2].provisional_division = 2;
        collate(&mut ctx).unwrap();
        division_statistics(&mut ctx);

        let first = &ctx.divisions[1];
        assert_eq!(first.count, 2);
        assert_eq!(first.mean.total_millis(), 60_500);
        assert_abs_diff_eq!(first.std_dev, 0.5);
        assert_abs_diff_eq!(first.handicap_delta, 0.05, epsilon = 1e-12);
        assert_eq!(ctx.divisions[2].count, 1);
        assert_eq!(ctx.divisions[3].count, 0);
        assert_abs_diff_eq!(ctx.overall.handicap_delta, 0.1 / 3.0, epsilon = 1e-12);
    }
}
