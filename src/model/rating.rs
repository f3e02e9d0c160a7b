use crate::model::{
    constants::{DIV_COUNT, RATING_CEILING},
    context::EventContext,
    db_structs::{DivisionStat, Entry},
    structures::subdivision::Subdivision
};

/// Places `entry` inside its provisional division's thresholds.
///
/// The rating is `(3 * division + subdivision + fraction) / 3`, where the
/// fraction is the entry's position inside its bracket, so the whole part of a
/// rating is the division it implies. Ratings are kept in `[0, RATING_CEILING]`.
pub fn rate_entry(entry: &mut Entry, stat: &DivisionStat) {
    let subdivision = stat.subdivision_of(entry.time);
    let (start, end) = stat.bracket(subdivision);

    let base = start.as_secs_f64();
    let range = end.as_secs_f64() - base;
    let fraction = if range > 0.0 {
        (entry.time.as_secs_f64() - base) / range
    } else {
        0.0
    };

    let raw = (3.0 * stat.division as f64 + subdivision.offset() as f64 + fraction) / 3.0;

    entry.subdivision = subdivision;
    entry.rating = raw.clamp(0.0, RATING_CEILING);
    entry.handicap_delta = if entry.is_rated() {
        entry.rating - entry.standing.rating
    } else {
        0.0
    };
}

/// Rates every eligible entry against the current thresholds and tallies the
/// performance buckets.
///
/// Rated participants count toward the division they race in. On the
/// qualifier, unrated participants instead tally their provisional
/// subdivision, giving the division distribution.
pub fn rate_entries(ctx: &mut EventContext) {
    let is_qualifier = ctx.event.is_qualifier();

    for entry in ctx.entries.iter_mut() {
        if !entry.is_eligible() {
            entry.rating = 0.0;
            entry.handicap_delta = 0.0;
            continue;
        }

        let provisional = entry.provisional_division.clamp(1, DIV_COUNT) as usize;
        rate_entry(entry, &ctx.divisions[provisional]);

        if entry.is_rated() {
            let division = entry.division().min(DIV_COUNT) as usize;
            ctx.divisions[division].performance.record(entry.handicap_delta);
        } else if is_qualifier {
            ctx.divisions[provisional].performance.tally(entry.subdivision);
        }
    }
}

/// Bracket the rating implies, with the division clamped to `1..=max_division`.
pub fn implied_standing(rating: f64, max_division: u32) -> (u32, Subdivision) {
    let whole = rating.floor();
    let division = (whole.max(0.0) as u32).clamp(1, max_division);

    if whole < 1.0 {
        return (division, Subdivision::Gold);
    }
    let subdivision = Subdivision::from_index((3.0 * (rating - division as f64)).floor() as i64);

    (division, subdivision)
}
