use crate::model::{
    constants::{DIV_IN_USE, SUB_DIVISION_RANGE},
    context::{EntryFilter, EventContext},
    db_structs::{Entry, EventConfig},
    structures::{disqualification::Disqualification, time_value::TimeValue}
};

/// Rated below the bottom of the bracket the participant is assigned to.
pub fn is_watch(entry: &Entry) -> bool {
    let standing = entry.standing;
    if standing.division == 0 || !entry.is_eligible() {
        return false;
    }
    let bracket = (standing.division * 3 + standing.subdivision.offset()) as f64;

    entry.rating * 3.0 < bracket
}

/// Assigned to one of the faster divisions but banded slower, and more than
/// two subdivisions off the handicap.
pub fn is_struggling(entry: &Entry) -> bool {
    let assigned = entry.standing.division;

    entry.is_eligible()
        && assigned > 0
        && assigned < DIV_IN_USE - 1
        && entry.provisional_division > assigned
        && entry.handicap_delta > 2.0 * SUB_DIVISION_RANGE
}

pub fn needs_replay(entry: &Entry, event: &EventConfig) -> bool {
    if event.is_final() {
        return false;
    }
    let podium = entry.place.is_some_and(|p| p <= 3);

    podium || entry.standing.rookie || entry.handicap_delta < -SUB_DIVISION_RANGE
}

/// The review note printed next to a result.
pub fn replay_note(entry: &Entry, event: &EventConfig) -> String {
    if entry.disqualification >= Disqualification::Verified {
        entry.disqualification.to_string()
    } else if needs_replay(entry, event) {
        "(Replay Verify Required)".to_string()
    } else {
        String::new()
    }
}

/// The entry's result expressed as a time on the division 3 gold scale.
pub fn handicap_time(ctx: &EventContext, entry: &Entry) -> TimeValue {
    let base = ctx.divisions[1].gold.as_secs_f64();
    let mid = ctx.divisions[3].gold.as_secs_f64();

    TimeValue::from_secs_f64(mid + (mid - base) * (entry.rating - entry.standing.rating))
}

pub fn watch_list(ctx: &EventContext) -> Vec<&Entry> {
    ctx.select(EntryFilter::eligible()).filter(|e| is_watch(e)).collect()
}

pub fn struggle_list(ctx: &EventContext) -> Vec<&Entry> {
    ctx.select(EntryFilter::eligible()).filter(|e| is_struggling(e)).collect()
}
