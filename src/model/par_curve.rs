use tracing::debug;

use crate::model::{
    constants::{DIV_COUNT, QUALITY_MIN_COUNT, THRESHOLD_EPSILON},
    context::{EntryFilter, EventContext},
    statistics::mean_and_std_dev,
    structures::time_value::TimeValue
};

/// Threshold times of one division, in seconds before truncation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub par: f64,
    pub gold: f64,
    pub silver: f64,
    pub bronze: f64
}

/// Computes par/gold/silver/bronze for every division from the overall quality
/// statistics and the event curve, then re-bands the entries and refreshes the
/// per-division quality figures. Performance buckets are cleared for the next
/// rating pass.
pub fn calculate_par(ctx: &mut EventContext) {
    let base = ctx.overall.quality_mean.as_secs_f64() - ctx.overall.quality_std_dev * 2.0 + ctx.event.scoot;
    let increment = ctx.overall.quality_std_dev * ctx.event.squeeze;

    for division in 1..=DIV_COUNT {
        let thresholds = thresholds(ctx, division, base, increment);
        let stat = &mut ctx.divisions[division as usize];

        stat.par = TimeValue::from_secs_f64(thresholds.par);
        stat.gold = TimeValue::from_secs_f64(thresholds.gold);
        stat.silver = TimeValue::from_secs_f64(thresholds.silver);
        stat.bronze = TimeValue::from_secs_f64(thresholds.bronze);
        stat.performance.reset();
    }

    debug!(
        "Par curve: base {:.3}s, increment {:.3}s (scoot {:.3}, squeeze {:.3})",
        base, increment, ctx.event.scoot, ctx.event.squeeze
    );

    assign_provisional_divisions(ctx);
    quality_bands(ctx);
}

/// Thresholds for one division. Trophy fractions are clamped so that
/// `par <= gold <= silver <= bronze` holds whatever the shift.
pub fn thresholds(ctx: &EventContext, division: u32, base: f64, increment: f64) -> Thresholds {
    let curve = &ctx.event.curve;
    let low = curve.point(division as usize);
    let high = curve.point(division as usize + 1);

    let par = base + increment * low;
    let bronze = (base + increment * high - THRESHOLD_EPSILON).max(par);
    let span = bronze - par;

    let fractions = curve.trophy_fractions();
    let adjust = curve.trophy_adjust(division);
    let gold_fraction = (fractions[0] + adjust).clamp(0.0, 1.0);
    let silver_fraction = (fractions[1] + adjust).clamp(gold_fraction, 1.0);

    Thresholds {
        par,
        gold: par + span * gold_fraction,
        silver: par + span * silver_fraction,
        bronze
    }
}

/// The first division whose bronze time the entry beats. Anything slower than
/// every band lands in the last division.
pub fn provisional_division(ctx: &EventContext, time: TimeValue) -> u32 {
    (1..=DIV_COUNT)
        .find(|d| time < ctx.divisions[*d as usize].bronze)
        .unwrap_or(DIV_COUNT)
}

fn assign_provisional_divisions(ctx: &mut EventContext) {
    let bronze: Vec<TimeValue> = ctx.divisions.iter().map(|d| d.bronze).collect();

    for entry in ctx.entries.iter_mut() {
        entry.provisional_division = (1..=DIV_COUNT)
            .find(|d| entry.time < bronze[*d as usize])
            .unwrap_or(DIV_COUNT);
    }
}

/// Quality mean and deviation of each division's band. Bands too thin to say
/// anything take the overall quality figures.
fn quality_bands(ctx: &mut EventContext) {
    for division in 1..=DIV_COUNT {
        let band: Vec<TimeValue> = ctx
            .select(EntryFilter::eligible())
            .filter(|e| e.provisional_division == division)
            .map(|e| e.time)
            .collect();

        let (mean, deviation) = if band.len() as u32 >= QUALITY_MIN_COUNT {
            mean_and_std_dev(&band).unwrap_or((TimeValue::ZERO, 0.0))
        } else {
            (ctx.overall.quality_mean, ctx.overall.quality_std_dev)
        };

        let stat = &mut ctx.divisions[division as usize];
        stat.quality_count = band.len() as u32;
        stat.quality_mean = mean;
        stat.quality_std_dev = deviation;
    }
}

#[cfg(test)]
mod tests {
    use super::{calculate_par, provisional_division};
    use crate::{
        model::{
            constants::DIV_COUNT,
            context::EventContext,
            statistics::collate,
            structures::{
                curve_shape::{CurveShape, ParCurve},
                time_value::TimeValue
            }
        },
        utils::test_utils::{generate_context, generate_lap_times}
    };
    use approx::assert_abs_diff_eq;

    fn manual(ctx: &mut EventContext, squeeze: f64, scoot: f64) {
        ctx.event.set_squeeze(squeeze);
        ctx.event.set_scoot(scoot);
    }

    #[test]
    fn test_flat_thresholds() {
        // quality mean 61.000s, quality sd sqrt(2/3)
        let mut ctx = generate_context(&[60_000, 61_000, 62_000, 67_000]);
        ctx.event.curve = ParCurve::new(CurveShape::Flat);
        manual(&mut ctx, 1.0, 0.0);
        collate(&mut ctx).unwrap();
        calculate_par(&mut ctx);

        let q_sd = (2.0f64 / 3.0).sqrt();
        let base = 61.0 - 2.0 * q_sd;
        let first = &ctx.divisions[1];

        assert_eq!(first.par, TimeValue::from_secs_f64(base));
        assert_eq!(first.bronze, TimeValue::from_secs_f64(base + q_sd - 0.001));
        let span = (base + q_sd - 0.001) - base;
        assert_eq!(first.gold, TimeValue::from_secs_f64(base + span * (1.0 / 3.0)));
        assert_eq!(first.silver, TimeValue::from_secs_f64(base + span * (2.0 / 3.0)));
    }

    #[test]
    fn test_thresholds_are_monotonic_for_every_shape() {
        let times = generate_lap_times(120, 95_000, 4_000);

        for shape in [
            CurveShape::Qualifier,
            CurveShape::Flat,
            CurveShape::Standard,
            CurveShape::Hybrid,
            CurveShape::Double,
            CurveShape::Multiply,
            CurveShape::Custom
        ] {
            let mut ctx = generate_context(&times);
            ctx.event.curve = ParCurve::new(shape);
            ctx.event.curve.set_trophy_adjust(2, -0.6).unwrap();
            ctx.event.curve.set_trophy_adjust(3, 0.6).unwrap();
            collate(&mut ctx).unwrap();
            calculate_par(&mut ctx);

            for d in 1..=DIV_COUNT as usize {
                let stat = &ctx.divisions[d];
                assert!(stat.par <= stat.gold, "{:?} d{}", shape, d);
                assert!(stat.gold <= stat.silver, "{:?} d{}", shape, d);
                assert!(stat.silver <= stat.bronze, "{:?} d{}", shape, d);
                if d > 1 {
                    assert!(ctx.divisions[d - 1].bronze <= stat.par, "{:?} d{}", shape, d);
                }
            }
        }
    }

    #[test]
    fn test_zero_spread_keeps_thresholds_ordered() {
        let mut ctx = generate_context(&[60_000, 60_000, 60_000]);
        collate(&mut ctx).unwrap();
        calculate_par(&mut ctx);

        let first = &ctx.divisions[1];
        assert_abs_diff_eq!(ctx.overall.quality_std_dev, 0.0);
        assert!(first.par <= first.gold && first.gold <= first.silver && first.silver <= first.bronze);
    }

    #[test]
    fn test_identical_times_land_in_the_last_division() {
        let mut ctx = generate_context(&[60_000; 5]);
        manual(&mut ctx, 1.2, 0.0);
        collate(&mut ctx).unwrap();
        calculate_par(&mut ctx);

        // every bronze collapses onto par, and nobody beats it
        for division in 1..=DIV_COUNT {
            assert_eq!(ctx.divisions[division as usize].bronze, TimeValue::from_millis(60_000));
        }
        assert!(ctx.entries.iter().all(|e| e.provisional_division == DIV_COUNT));
        assert_eq!(provisional_division(&ctx, TimeValue::from_millis(60_000)), DIV_COUNT);
        assert_eq!(provisional_division(&ctx, TimeValue::from_millis(59_999)), 1);
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let times = generate_lap_times(40, 80_000, 3_000);
        let mut ctx = generate_context(&times);
        collate(&mut ctx).unwrap();
        calculate_par(&mut ctx);
        let first_pass = ctx.divisions.clone();

        calculate_par(&mut ctx);
        assert_eq!(ctx.divisions, first_pass);
    }

    #[test]
    fn test_provisional_division_bands() {
        let times = generate_lap_times(60, 90_000, 5_000);
        let mut ctx = generate_context(&times);
        collate(&mut ctx).unwrap();
        calculate_par(&mut ctx);

        for entry in &ctx.entries {
            let d = entry.provisional_division;
            assert!((1..=DIV_COUNT).contains(&d));
            assert_eq!(provisional_division(&ctx, entry.time), d);
            if d < DIV_COUNT {
                assert!(entry.time < ctx.divisions[d as usize].bronze);
            }
            if d > 1 {
                assert!(entry.time >= ctx.divisions[d as usize - 1].bronze);
            }
        }
    }

    #[test]
    fn test_thin_bands_use_overall_quality() {
        let mut ctx = generate_context(&[60_000, 61_000, 62_000, 67_000]);
        collate(&mut ctx).unwrap();
        calculate_par(&mut ctx);

        for d in 1..=DIV_COUNT as usize {
            let stat = &ctx.divisions[d];
            if stat.quality_count < 3 {
                assert_eq!(stat.quality_mean, ctx.overall.quality_mean);
                assert_abs_diff_eq!(stat.quality_std_dev, ctx.overall.quality_std_dev);
            }
        }
    }
}
