use tracing::{error, info, warn};

use crate::model::{
    auto_tune::tune,
    context::EventContext,
    db_structs::{EventConfig, Player, Submission},
    promotion::{self, PromotionReport},
    ranking::assign_handicap_places,
    rating_tracker::{FoldSummary, RatingTracker, RegistrationError},
    statistics::{collate, StatsError}
};

/// A submission line that was not registered.
#[derive(Debug, PartialEq)]
pub struct Rejection {
    pub line: usize,
    pub error: RegistrationError
}

/// What one run produced besides the finalized entries in the context.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Set when the statistics were degenerate and rating was skipped
    pub skipped: Option<StatsError>,
    /// Eligible entry indices in handicap order
    pub handicap_order: Vec<usize>,
    pub fold: FoldSummary,
    /// What a promotion run would do after this event
    pub promotions: PromotionReport
}

pub struct WrsModel {
    pub rating_tracker: RatingTracker,
    pub context: EventContext
}

impl WrsModel {
    pub fn new(players: &[Player], event: EventConfig) -> WrsModel {
        let mut tracker = RatingTracker::new();
        tracker.insert_or_update(players);

        WrsModel {
            rating_tracker: tracker,
            context: EventContext::new(event)
        }
    }

    /// Registers submissions in file order.
    ///
    /// Lines naming an unknown racer are skipped and returned; a capacity error
    /// stops registration. A repeated racer keeps only their latest submission.
    pub fn register_submissions(&mut self, submissions: &[Submission]) -> Result<Vec<Rejection>, RegistrationError> {
        let mut rejected = Vec::new();

        for submission in submissions {
            let entry = match self.rating_tracker.register(submission, &self.context.event) {
                Ok(entry) => entry,
                Err(e) if e.is_fatal() => {
                    error!("Line {}: {}, ignoring the rest of the file", submission.line, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Line {}: {}", submission.line, e);
                    rejected.push(Rejection {
                        line: submission.line,
                        error: e
                    });
                    continue;
                }
            };

            if entry.time.is_zero() && entry.is_eligible() {
                warn!("Line {}: {} has no time, skipped", submission.line, entry.display_name());
                self.rating_tracker.release_entry();
                continue;
            }

            match self.context.entries.iter_mut().find(|e| e.player_id == entry.player_id) {
                Some(existing) => {
                    warn!(
                        "Line {}: {} submitted twice, keeping the latest",
                        submission.line,
                        entry.display_name()
                    );
                    *existing = entry;
                    self.rating_tracker.release_entry();
                }
                None => self.context.entries.push(entry)
            }
        }

        info!("Registered {} entries", self.context.entries.len());
        Ok(rejected)
    }

    /// # Event processing
    ///
    /// 1. Sort entries by time and collate the overall statistics. Degenerate
    ///     statistics skip straight to step 4.
    /// 2. Build the par curve, rate and place, auto tuning squeeze and scoot.
    /// 3. Rank everyone by handicap delta.
    /// 4. Record results against the racers, folding final ones into their ratings.
    /// 5. Preview the promotions the new ratings call for. Applying them is
    ///     left to [`WrsModel::promote`].
    pub fn process(&mut self) -> RunOutcome {
        let mut outcome = RunOutcome::default();
        info!(
            "Processing week {} ({} entries, status {})",
            self.context.event.week,
            self.context.entries.len(),
            self.context.event.status.letter()
        );

        self.context.sort_by_time();
        match collate(&mut self.context) {
            Ok(()) => {
                tune(&mut self.context);
                outcome.handicap_order = assign_handicap_places(&mut self.context);
            }
            Err(e) => {
                warn!("Ratings skipped: {}", e);
                outcome.skipped = Some(e);
            }
        }

        outcome.fold = self
            .rating_tracker
            .fold_event(&self.context.entries, &self.context.event);
        info!(
            "Recorded {} results, {} folded into ratings",
            outcome.fold.recorded, outcome.fold.folded
        );

        outcome.promotions = promotion::evaluate(&self.rating_tracker);

        outcome
    }

    /// Evaluates promotions and rookie placements against the store, applying
    /// them when the event is final.
    pub fn promote(&mut self) -> (PromotionReport, bool) {
        let report = promotion::evaluate(&self.rating_tracker);
        let applied = promotion::apply(&mut self.rating_tracker, &report, &self.context.event);

        (report, applied)
    }

    /// Rebuilds every racer's weights and rating from their stored results.
    pub fn rebuild_weights(&mut self) -> usize {
        let rebuilt = self.rating_tracker.rebuild_weights();
        info!("Rebuilt weights for {} of {} racers", rebuilt, self.rating_tracker.len());
        rebuilt
    }

    pub fn players(&self) -> Vec<Player> {
        self.rating_tracker.players().cloned().collect()
    }
}
