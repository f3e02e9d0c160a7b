use serde::Serialize;
use tracing::info;

use crate::model::{
    constants::{DIV_IN_USE, MIN_PROMOTION_EVENT_COUNT},
    db_structs::{EventConfig, Player},
    rating::implied_standing,
    rating_tracker::RatingTracker,
    structures::subdivision::Subdivision
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Promotion {
    pub player_id: u32,
    pub name: String,
    pub rating: f64,
    pub delta: f64,
    pub from: (u32, Subdivision),
    pub to: (u32, Subdivision),
    pub double: bool
}

/// A participant leaving rookie status, placed by rating alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RookiePlacement {
    pub player_id: u32,
    pub name: String,
    pub rating: f64,
    pub division: u32,
    pub subdivision: Subdivision
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PromotionReport {
    pub promotions: Vec<Promotion>,
    pub placements: Vec<RookiePlacement>
}

impl PromotionReport {
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty() && self.placements.is_empty()
    }

    pub fn doubles(&self) -> impl Iterator<Item = &Promotion> {
        self.promotions.iter().filter(|p| p.double)
    }
}

/// Distance, in subdivisions, between the bottom of a participant's bracket
/// and their rating. Above 1 they have outrun the bracket.
pub fn promotion_delta(player: &Player) -> f64 {
    let bracket = (player.division * 3 + player.subdivision.offset() + 1) as f64;
    bracket - player.rating * 3.0
}

pub fn evaluate_player(player: &Player) -> Option<Promotion> {
    if player.division == 0 || player.verified_count < MIN_PROMOTION_EVENT_COUNT || !player.has_rating() {
        return None;
    }
    if player.division == 1 && player.subdivision == Subdivision::Gold {
        return None;
    }

    let delta = promotion_delta(player);
    if delta <= 1.0 {
        return None;
    }

    let from = (player.division, player.subdivision);
    let to = implied_standing(player.rating, DIV_IN_USE);
    if to >= from {
        return None;
    }

    Some(Promotion {
        player_id: player.id,
        name: player.display_name().to_string(),
        rating: player.rating,
        delta,
        from,
        to,
        double: delta > 2.0
    })
}

pub fn evaluate_placement(player: &Player) -> Option<RookiePlacement> {
    if player.division != 0 || player.is_rookie() || !player.has_rating() {
        return None;
    }
    let (division, subdivision) = implied_standing(player.rating, DIV_IN_USE);

    Some(RookiePlacement {
        player_id: player.id,
        name: player.display_name().to_string(),
        rating: player.rating,
        division,
        subdivision
    })
}

/// Promotions and rookie placements the current ratings call for.
pub fn evaluate(tracker: &RatingTracker) -> PromotionReport {
    let mut report = PromotionReport::default();

    for player in tracker.players() {
        if let Some(placement) = evaluate_placement(player) {
            report.placements.push(placement);
        } else if let Some(promotion) = evaluate_player(player) {
            report.promotions.push(promotion);
        }
    }

    report
}

/// Moves participants as the report says, but only for a final event.
/// Returns whether anything was applied.
pub fn apply(tracker: &mut RatingTracker, report: &PromotionReport, event: &EventConfig) -> bool {
    if !event.is_final() {
        return false;
    }

    for promotion in &report.promotions {
        if let Some(player) = tracker.get_player_mut(promotion.player_id) {
            (player.division, player.subdivision) = promotion.to;
        }
    }
    for placement in &report.placements {
        if let Some(player) = tracker.get_player_mut(placement.player_id) {
            player.division = placement.division;
            player.subdivision = placement.subdivision;
        }
    }

    info!(
        "Applied {} promotions and {} rookie placements",
        report.promotions.len(),
        report.placements.len()
    );
    !report.is_empty()
}
