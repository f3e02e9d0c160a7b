use std::cmp::Ordering;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    model::{
        constants::{
            MAX_ENTRIES, MAX_PLAYERS, NO_HARM_HANDICAP, QUALIFIER_REBUILD_WEIGHT, RATING_WEIGHT_CAP
        },
        db_structs::{Entry, EventConfig, Player, Submission},
        structures::{
            disqualification::Disqualification,
            history_ring::HistoryUpdate,
            race_result::RaceResult
        }
    },
    utils::progress_utils::progress_bar
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("entry limit of {limit} reached")]
    EntryCapacityExceeded { limit: usize },
    #[error("participant limit of {limit} reached")]
    PlayerCapacityExceeded { limit: usize },
    #[error("racer {0} is not registered")]
    UnregisteredParticipant(String),
    #[error("submission has neither a user name nor a tag")]
    MissingIdentity
}

impl RegistrationError {
    /// Capacity errors abandon the rest of the input; the others only the line.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RegistrationError::EntryCapacityExceeded { .. } | RegistrationError::PlayerCapacityExceeded { .. }
        )
    }
}

/// Counts from folding one event into the participant records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FoldSummary {
    pub recorded: usize,
    pub folded: usize,
    pub rejected: usize
}

/// Scales an event's weight down when the event rating sits far above the
/// participant's rating. Always in `(0, 1]`.
pub fn weight_adjust(player_rating: f64, event_rating: f64) -> f64 {
    let delta = event_rating - player_rating;
    let delta = if player_rating <= 0.0 || delta < 1.0 { 1.0 } else { delta };

    0.5 + 0.5 / delta
}

/// Folds `player.latest` into the long-term ratings.
///
/// The real rating takes the event rating as is. Unless the participant is a
/// rookie, the handicap rating only takes `min(event, current)`, so one bad
/// event cannot lower it. The accumulated weight is capped at
/// `RATING_WEIGHT_CAP`; at the cap, the prior aggregate gives up room for the
/// incoming weight.
pub fn update_rating(player: &mut Player) {
    let result = player.latest;
    player.event_count += 1;

    if !result.disqualification.is_eligible() {
        player.dq_count += 1;
    } else {
        let weight = result.weight;
        let mut prior_weight = player.total_weight;
        if prior_weight >= RATING_WEIGHT_CAP {
            prior_weight = RATING_WEIGHT_CAP - weight;
            if prior_weight <= 0.0 {
                prior_weight = RATING_WEIGHT_CAP;
            }
        }

        let real_aggregate = player.real_rating * prior_weight + result.rating * weight;
        let protected = result.rating.min(player.rating);
        let aggregate = player.rating * prior_weight + protected * weight;
        let combined = prior_weight + weight;

        if combined > 0.0 {
            player.real_rating = real_aggregate / combined;
            player.rating = if NO_HARM_HANDICAP && !player.is_rookie() {
                aggregate / combined
            } else {
                player.real_rating
            };
        } else {
            player.rating = 0.0;
        }

        if result.disqualification == Disqualification::Verified {
            player.verified_count += weight;
        }
        player.total_weight = (player.total_weight + weight).min(RATING_WEIGHT_CAP);
    }

    if player.real_rating <= 0.0 {
        player.real_rating = player.rating;
    } else if player.rating <= 0.0 {
        player.rating = player.real_rating;
    }
}

/// Recomputes a participant's weights and handicap from the stored results.
///
/// A recorded qualifier counts with a fixed weight, then every final eligible
/// history result, oldest first, is weighted against the running average.
/// Returns `false` when there was nothing to rebuild from.
pub fn rebuild_weights(player: &mut Player) -> bool {
    let mut total = 0.0;
    let mut aggregate = 0.0;

    if player.qualifier.is_recorded() {
        player.qualifier.weight = QUALIFIER_REBUILD_WEIGHT;
        total = QUALIFIER_REBUILD_WEIGHT;
        aggregate = player.qualifier.rating * QUALIFIER_REBUILD_WEIGHT;
    }

    for result in player.history.iter_mut().rev() {
        if !result.counts_toward_rating() {
            continue;
        }
        let average = if total > 0.0 { aggregate / total } else { 0.0 };
        result.weight = weight_adjust(average, result.rating);
        total += result.weight;
        aggregate += result.rating * result.weight;
    }

    if total <= 0.0 {
        return false;
    }
    player.rating = aggregate / total;
    player.total_weight = total.min(RATING_WEIGHT_CAP);
    true
}

/// Every known participant, keyed by id in load order.
#[derive(Debug, Clone, Default)]
pub struct RatingTracker {
    players: IndexMap<u32, Player>,
    max_id: u32,
    entry_count: usize
}

impl RatingTracker {
    pub fn new() -> RatingTracker {
        RatingTracker {
            players: IndexMap::new(),
            max_id: 0,
            entry_count: 0
        }
    }

    /// Inserts or replaces a set of participants, e.g. fresh from the store.
    pub fn insert_or_update(&mut self, players: &[Player]) {
        for player in players {
            self.max_id = self.max_id.max(player.id);
            self.players.insert(player.id, player.clone());
        }
    }

    pub fn get_player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<u32> {
        self.players.values().find(|p| p.tag == tag).map(|p| p.id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<u32> {
        self.players.values().find(|p| p.name == name).map(|p| p.id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    /// Rebuilds every participant from their stored results, returning how many changed.
    pub fn rebuild_weights(&mut self) -> usize {
        let mut rebuilt = 0;
        for player in self.players.values_mut() {
            if rebuild_weights(player) {
                debug!("Rebuilt {}: weight {:.3}, rating {:.3}", player.display_name(), player.total_weight, player.rating);
                rebuilt += 1;
            }
        }
        rebuilt
    }

    /// Rated participants, best (lowest) handicap first.
    pub fn leaderboard(&self) -> Vec<&Player> {
        self.players
            .values()
            .filter(|p| p.has_rating())
            .sorted_by(|a, b| a.rating.partial_cmp(&b.rating).unwrap_or(Ordering::Equal))
            .collect()
    }

    /// Resolves the participant a submission belongs to and builds its entry.
    ///
    /// The tag is matched first, then the user name. Values the submission
    /// carries overwrite the stored ones. Only the qualifier may create
    /// participants.
    pub fn register(&mut self, submission: &Submission, event: &EventConfig) -> Result<Entry, RegistrationError> {
        if self.entry_count >= MAX_ENTRIES {
            return Err(RegistrationError::EntryCapacityExceeded { limit: MAX_ENTRIES });
        }

        let tag = submission.tag.as_deref().filter(|t| !t.is_empty());
        let user = submission.user.as_deref().filter(|u| !u.is_empty());
        if tag.is_none() && user.is_none() {
            return Err(RegistrationError::MissingIdentity);
        }

        let known = tag
            .and_then(|t| self.find_by_tag(t))
            .or_else(|| user.and_then(|u| self.find_by_name(u)));
        let id = match known {
            Some(id) => id,
            None if event.is_qualifier() => self.create(user.unwrap_or_default(), tag.unwrap_or_default())?,
            None => {
                let name = tag.or(user).unwrap_or_default();
                return Err(RegistrationError::UnregisteredParticipant(name.to_string()));
            }
        };

        let Some(player) = self.players.get_mut(&id) else {
            return Err(RegistrationError::UnregisteredParticipant(tag.or(user).unwrap_or_default().to_string()));
        };
        if let Some(user) = user {
            player.name = user.to_string();
        }
        if let Some(tag) = tag {
            player.tag = tag.to_string();
        }
        if let Some(country) = submission.country.as_ref().filter(|c| !c.is_empty()) {
            player.country = Some(country.clone());
        }

        let (time, disqualification) = submission.resolve();
        self.entry_count += 1;

        Ok(Entry::new(player, time, &submission.splits, disqualification))
    }

    /// Frees an entry slot, used when a later submission replaces an earlier one.
    pub fn release_entry(&mut self) {
        self.entry_count = self.entry_count.saturating_sub(1);
    }

    /// Stored ids stay below `MAX_PLAYERS`, so the ceiling binds on the id as
    /// well as on the head count.
    fn create(&mut self, name: &str, tag: &str) -> Result<u32, RegistrationError> {
        if self.players.len() >= MAX_PLAYERS || self.max_id + 1 >= MAX_PLAYERS as u32 {
            return Err(RegistrationError::PlayerCapacityExceeded { limit: MAX_PLAYERS });
        }
        self.max_id += 1;
        let id = self.max_id;
        self.players.insert(id, Player::new(id, name, tag));
        debug!("Registered new racer {} as id {}", if tag.is_empty() { name } else { tag }, id);

        Ok(id)
    }

    /// Records every entry's result against its participant and folds the ones
    /// a final event allows into the long-term ratings.
    ///
    /// A final qualifier is only folded once. Replacing an already final
    /// history result, or a result older than a full history, does not fold.
    pub fn fold_event(&mut self, entries: &[Entry], event: &EventConfig) -> FoldSummary {
        let mut summary = FoldSummary::default();
        let bar = progress_bar(entries.len() as u64, "Updating ratings".to_string());

        for entry in entries {
            if let Some(bar) = &bar {
                bar.inc(1);
            }
            let Some(player) = self.players.get_mut(&entry.player_id) else {
                warn!("Entry for unknown racer id {} skipped", entry.player_id);
                continue;
            };

            player.latest = RaceResult {
                race_id: event.week,
                status: event.status,
                disqualification: entry.disqualification,
                weight: event.weight * weight_adjust(player.rating, entry.rating),
                rating: entry.rating
            };
            summary.recorded += 1;

            let mut fold = event.is_final();
            if event.is_qualifier() {
                if player.qualifier.status.is_final() {
                    fold = false;
                } else {
                    player.qualifier = player.latest;
                }
            } else {
                match player.history.upsert(player.latest) {
                    Ok(HistoryUpdate::Replaced(previous)) if previous.status.is_final() => fold = false,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("{}: {}", player.display_name(), e);
                        summary.rejected += 1;
                        fold = false;
                    }
                }
            }

            if fold {
                update_rating(player);
                summary.folded += 1;
            }
        }

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        summary
    }
}
