use tracing::{debug, info, warn};

use crate::model::{
    constants::{AUTO_CYCLE_COUNT, AUTO_SCOOT_DAMPING, AUTO_SCOOT_FRACTION, DIV_IN_USE, QUALITY_MIN_COUNT},
    context::{EntryFilter, EventContext},
    par_curve::calculate_par,
    rating::rate_entries,
    ranking::{assign_division_places, assign_overall_places},
    statistics::division_statistics
};

/// One full pass over fixed squeeze and scoot: thresholds, ratings, division
/// statistics and places.
pub fn run_pass(ctx: &mut EventContext) {
    calculate_par(ctx);
    rate_entries(ctx);
    assign_overall_places(ctx);
    division_statistics(ctx);
    assign_division_places(ctx);
}

/// Scoot that pulls the fastest racers back onto their handicap.
///
/// Averages the handicap correction of the fastest fifth of the field, taken
/// from division 1, or from everyone when division 1 has fewer than three
/// entries. Unrated participants contribute no correction.
pub fn auto_scoot(ctx: &EventContext) -> f64 {
    let filter = if ctx.divisions[1].count < QUALITY_MIN_COUNT {
        EntryFilter::eligible()
    } else {
        EntryFilter::division(1)
    };
    let sample = ctx.overall.count as usize / AUTO_SCOOT_FRACTION;
    let scale = ctx.event.curve.point(2) * ctx.overall.quality_std_dev * AUTO_SCOOT_DAMPING;

    let corrections: Vec<f64> = ctx
        .select(filter)
        .take(sample)
        .map(|e| -e.handicap_delta * scale)
        .collect();

    if corrections.is_empty() {
        return ctx.event.scoot;
    }
    let average = corrections.iter().sum::<f64>() / corrections.len() as f64;

    ctx.event.scoot - average
}

/// Squeeze plus the participation-weighted handicap delta of the divisions in
/// use. `None` when that would leave the squeeze non-positive.
pub fn auto_squeeze(ctx: &EventContext) -> Option<f64> {
    let weighted: f64 = (1..=DIV_IN_USE)
        .map(|d| &ctx.divisions[d as usize])
        .map(|stat| stat.count as f64 * stat.handicap_delta)
        .sum();

    let average = match ctx.overall.count {
        0 => 0.0,
        count => weighted / count as f64
    };
    let squeeze = ctx.event.squeeze + average;

    if squeeze > 0.0 {
        Some(squeeze)
    } else {
        None
    }
}

/// Runs the first pass, then refines scoot and squeeze for a fixed number of
/// cycles when either is on auto. Scoot stops adjusting two cycles before the
/// end so the last squeeze steps settle against a fixed offset.
pub fn tune(ctx: &mut EventContext) {
    run_pass(ctx);

    if !(ctx.event.auto_scoot || ctx.event.auto_squeeze) {
        return;
    }

    for cycle in 0..AUTO_CYCLE_COUNT {
        if ctx.event.auto_scoot && cycle < AUTO_CYCLE_COUNT - 2 {
            ctx.event.scoot = auto_scoot(ctx);
            run_pass(ctx);
        }

        if ctx.event.auto_squeeze {
            match auto_squeeze(ctx) {
                Some(squeeze) => {
                    ctx.event.squeeze = squeeze;
                    run_pass(ctx);
                }
                None => warn!(
                    "Auto squeeze went non-positive in cycle {}, keeping {:.3}",
                    cycle, ctx.event.squeeze
                )
            }
        }

        debug!(
            "Auto adjust cycle {}: scoot={:.3}, squeeze={:.3}",
            cycle, ctx.event.scoot, ctx.event.squeeze
        );
    }

    if ctx.event.auto_scoot {
        info!("Scoot auto adjusted to {:.3}", ctx.event.scoot);
    }
    if ctx.event.auto_squeeze {
        info!("Squeeze auto adjusted to {:.3}", ctx.event.squeeze);
    }
}
