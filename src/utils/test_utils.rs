use crate::model::{
    context::EventContext,
    db_structs::{Entry, EventConfig, Player, Submission},
    rating::implied_standing,
    constants::DIV_IN_USE,
    structures::{disqualification::Disqualification, time_value::TimeValue}
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Lap times in milliseconds, uniform within `mean ± spread`. Seeded, so every
/// call with the same arguments returns the same times.
pub fn generate_lap_times(count: usize, mean: i64, spread: i64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    (0..count)
        .map(|_| rng.random_range(mean - spread..=mean + spread))
        .collect()
}

pub fn generate_entry(player_id: u32, millis: i64) -> Entry {
    Entry {
        player_id,
        name: format!("user_{}", player_id),
        tag: format!("player_{}", player_id),
        time: TimeValue::from_millis(millis),
        disqualification: Disqualification::Ok,
        ..Default::default()
    }
}

/// A qualifier context with one unrated entry per time, sorted by time.
pub fn generate_context(times: &[i64]) -> EventContext {
    let mut ctx = EventContext::new(EventConfig::default());
    for (i, millis) in times.iter().enumerate() {
        ctx.entries.push(generate_entry(i as u32 + 1, *millis));
    }
    ctx.sort_by_time();

    ctx
}

/// An established racer: weight and verified count both equal `total_weight`,
/// placed in the bracket their rating implies.
pub fn generate_player(id: u32, rating: f64, total_weight: f64) -> Player {
    let mut player = Player::new(id, &format!("user_{}", id), &format!("player_{}", id));
    player.rating = rating;
    player.real_rating = rating;
    player.total_weight = total_weight;
    player.verified_count = total_weight;

    if rating > 0.0 {
        (player.division, player.subdivision) = implied_standing(rating, DIV_IN_USE);
    }

    player
}

pub fn generate_submissions(count: usize, mean: i64) -> Vec<Submission> {
    generate_lap_times(count, mean, 2_000)
        .into_iter()
        .enumerate()
        .map(|(i, millis)| Submission {
            line: i + 1,
            user: Some(format!("user_{}", i + 1)),
            tag: Some(format!("player_{}", i + 1)),
            time: Some(TimeValue::from_millis(millis)),
            ..Default::default()
        })
        .collect()
}
