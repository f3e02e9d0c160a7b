use std::cmp::Ordering;

use itertools::Itertools;

use crate::model::{
    constants::{DIV_COUNT, MAX_POINTS_PLACES, MAX_RACER_POINTS, MIN_POINTS},
    context::{EntryFilter, EventContext}
};

/// Season points by number of racers in the division (row) and place (column).
/// Column 0 is unused; rows past the last are capped to it.
pub const POINTS_TABLE: [[u32; MAX_POINTS_PLACES as usize + 1]; MAX_RACER_POINTS + 1] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 6, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 7, 2, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 8, 3, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 9, 4, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 9, 5, 2, 0, 0, 0, 0, 0, 0, 0],
    [0, 9, 6, 3, 1, 0, 0, 0, 0, 0, 0],
    [0, 9, 7, 4, 2, 0, 0, 0, 0, 0, 0],
    [0, 9, 7, 5, 3, 1, 0, 0, 0, 0, 0],
    [0, 10, 8, 6, 3, 1, 0, 0, 0, 0, 0],
    [0, 10, 8, 6, 4, 2, 1, 0, 0, 0, 0],
    [0, 10, 9, 7, 4, 3, 1, 0, 0, 0, 0],
    [0, 10, 9, 7, 5, 4, 2, 1, 0, 0, 0],
    [0, 10, 9, 8, 5, 4, 3, 1, 0, 0, 0],
    [0, 10, 9, 8, 6, 5, 3, 2, 1, 0, 0],
    [0, 10, 9, 8, 6, 5, 4, 3, 1, 0, 0],
    [0, 10, 9, 8, 7, 6, 4, 3, 2, 1, 0],
    [0, 10, 9, 8, 7, 6, 5, 4, 2, 1, 0],
    [0, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]
];

/// Points for `place` among `racers` eligible entries.
pub fn points_for(place: u32, racers: u32) -> u32 {
    if place == 0 || place > MAX_POINTS_PLACES {
        return MIN_POINTS;
    }
    let row = (racers as usize).min(MAX_RACER_POINTS);

    POINTS_TABLE[row][place as usize].max(MIN_POINTS)
}

/// Standard competition ranking ("1224") of keys already in order. Equal keys
/// share a place; the next distinct key is placed after everything before it.
pub fn competition_places<K: PartialEq>(keys: &[K]) -> Vec<u32> {
    let mut places = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let place = match places.last() {
            Some(prior) if keys[i - 1] == *key => *prior,
            _ => i as u32 + 1
        };
        places.push(place);
    }
    places
}

/// Overall time places across every eligible entry. Disqualified entries are unplaced.
pub fn assign_overall_places(ctx: &mut EventContext) {
    let times: Vec<_> = ctx.select(EntryFilter::eligible()).map(|e| e.time).collect();
    let places = competition_places(&times);

    for entry in ctx.entries.iter_mut() {
        entry.overall_place = None;
    }
    for (entry, place) in ctx.select_mut(EntryFilter::eligible()).zip(places) {
        entry.overall_place = Some(place);
    }
}

/// Division places and season points. Disqualified entries get neither.
pub fn assign_division_places(ctx: &mut EventContext) {
    for entry in ctx.entries.iter_mut() {
        entry.place = None;
        entry.points = 0;
    }

    for division in 1..=DIV_COUNT {
        let filter = EntryFilter::division(division);
        let times: Vec<_> = ctx.select(filter).map(|e| e.time).collect();
        let racers = times.len() as u32;
        let places = competition_places(&times);

        for (entry, place) in ctx.select_mut(filter).zip(places) {
            entry.place = Some(place);
            entry.points = points_for(place, racers);
        }
    }
}

/// Indices of the eligible entries in handicap order.
///
/// Rated participants come first, best (lowest) handicap delta first.
/// Unrated participants have no handicap to beat and follow in time order.
pub fn handicap_order(ctx: &EventContext) -> Vec<usize> {
    ctx.entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_eligible())
        .sorted_by(|(_, a), (_, b)| match (a.is_rated(), b.is_rated()) {
            (true, true) => a
                .handicap_delta
                .partial_cmp(&b.handicap_delta)
                .unwrap_or(Ordering::Equal),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a.time.cmp(&b.time)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Handicap places for the cross-division leaderboard.
pub fn assign_handicap_places(ctx: &mut EventContext) -> Vec<usize> {
    let order = handicap_order(ctx);
    let keys: Vec<(bool, i64)> = order
        .iter()
        .map(|i| {
            let e = &ctx.entries[*i];
            if e.is_rated() {
                (true, (e.handicap_delta * 1e9).round() as i64)
            } else {
                (false, e.time.total_millis())
            }
        })
        .collect();
    let places = competition_places(&keys);

    for entry in ctx.entries.iter_mut() {
        entry.handicap_place = None;
    }
    for (i, place) in order.iter().zip(places) {
        ctx.entries[*i].handicap_place = Some(place);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::{
        assign_division_places, assign_handicap_places, assign_overall_places, competition_places, points_for,
        POINTS_TABLE
    };
    use crate::{
        model::structures::disqualification::Disqualification,
        utils::test_utils::generate_context
    };

    #[test]
    fn test_competition_places() {
        assert_eq!(competition_places(&[1, 2, 2, 3]), vec![1, 2, 2, 4]);
        assert_eq!(competition_places(&[5, 5, 5]), vec![1, 1, 1]);
        assert_eq!(competition_places::<u32>(&[]), Vec::<u32>::new());
    }

    #[test]
    fn test_five_racer_points() {
        let points: Vec<u32> = (1..=5).map(|place| points_for(place, 5)).collect();
        assert_eq!(points, vec![9, 4, 1, 0, 0]);
    }

    #[test]
    fn test_points_rows_cap() {
        assert_eq!(points_for(1, 45), 10);
        assert_eq!(points_for(10, 45), 1);
        assert_eq!(points_for(11, 45), 0);
        assert_eq!(points_for(0, 5), 0);
    }

    #[test]
    fn test_points_never_exceed_row_maximum() {
        for racers in 0..30u32 {
            let row = POINTS_TABLE[(racers as usize).min(20)];
            let max = *row.iter().max().unwrap();
            for place in 0..15 {
                assert!(points_for(place, racers) <= max);
            }
        }
    }

    #[test]
    fn test_division_places_with_ties() {
        let mut ctx = generate_context(&[60_000, 61_000, 61_000, 62_000, 63_000]);
        for entry in ctx.entries.iter_mut() {
            entry.provisional_division = 1;
        }
        assign_division_places(&mut ctx);

        let places: Vec<Option<u32>> = ctx.entries.iter().map(|e| e.place).collect();
        let points: Vec<u32> = ctx.entries.iter().map(|e| e.points).collect();
        assert_eq!(places, vec![Some(1), Some(2), Some(2), Some(4), Some(5)]);
        assert_eq!(points, vec![9, 4, 4, 0, 0]);
    }

    #[test]
    fn test_disqualified_entries_are_unplaced() {
        let mut ctx = generate_context(&[60_000, 61_000, 62_000]);
        for entry in ctx.entries.iter_mut() {
            entry.provisional_division = 1;
        }
        ctx.entries[0].disqualification = Disqualification::Contact;
        assign_division_places(&mut ctx);
        assign_overall_places(&mut ctx);

        assert_eq!(ctx.entries[0].place, None);
        assert_eq!(ctx.entries[0].overall_place, None);
        assert_eq!(ctx.entries[0].points, 0);
        assert_eq!(ctx.entries[1].place, Some(1));
        assert_eq!(ctx.entries[1].points, 6);
        assert_eq!(ctx.entries[2].overall_place, Some(2));
    }

    #[test]
    fn test_places_are_scoped_per_division() {
        let mut ctx = generate_context(&[60_000, 61_000, 62_000, 63_000]);
        ctx.entries[0].provisional_division = 1;
        ctx.entries[1].provisional_division = 2;
        ctx.entries[2].provisional_division = 1;
        ctx.entries[3].standing.division = 2;
        assign_division_places(&mut ctx);

        let places: Vec<Option<u32>> = ctx.entries.iter().map(|e| e.place).collect();
        assert_eq!(places, vec![Some(1), Some(1), Some(2), Some(2)]);
    }

    #[test]
    fn test_handicap_places() {
        let mut ctx = generate_context(&[60_000, 61_000, 62_000, 63_000, 64_000]);
        let deltas = [0.3, -0.2, 0.3, 0.0, 0.0];
        for (entry, delta) in ctx.entries.iter_mut().zip(deltas) {
            entry.standing.rating = 2.0;
            entry.handicap_delta = delta;
        }
        ctx.entries[4].standing.rating = 0.0;
        let order = assign_handicap_places(&mut ctx);

        assert_eq!(order, vec![1, 3, 0, 2, 4]);
        let places: Vec<Option<u32>> = ctx.entries.iter().map(|e| e.handicap_place).collect();
        assert_eq!(places, vec![Some(3), Some(1), Some(3), Some(2), Some(5)]);
    }
}
