use serde::{Deserialize, Serialize};

use crate::model::{
    constants::{
        DEFAULT_SCOOT, DEFAULT_SQUEEZE, DEFAULT_WEIGHT, EVENT_QUALIFIER, MAX_SPLITS, ROOKIE_TIME, SUB_DIVISION_RANGE
    },
    structures::{
        curve_shape::ParCurve, disqualification::Disqualification, event_status::EventStatus,
        history_ring::HistoryRing, race_result::RaceResult, subdivision::Subdivision, time_value::TimeValue
    }
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// Platform tag shown in results
    pub tag: String,
    pub country: Option<String>,
    /// Handicap rating, protected by the no-harm rule
    pub rating: f64,
    /// Unprotected skill estimate
    pub real_rating: f64,
    pub total_weight: f64,
    /// 0 while unassigned
    pub division: u32,
    pub subdivision: Subdivision,
    pub event_count: u32,
    pub dq_count: u32,
    pub verified_count: f64,
    pub qualifier: RaceResult,
    pub history: HistoryRing,
    #[serde(skip)]
    pub latest: RaceResult
}

impl Player {
    pub fn new(id: u32, name: &str, tag: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// Rookies have neither a final qualifier nor enough weighted, verified history.
    pub fn is_rookie(&self) -> bool {
        let established = self.total_weight >= ROOKIE_TIME && self.verified_count >= ROOKIE_TIME;
        !(self.qualifier.status.is_final() || established)
    }

    pub fn has_rating(&self) -> bool {
        self.rating > 0.0
    }

    pub fn display_name(&self) -> &str {
        if self.tag.is_empty() {
            &self.name
        } else {
            &self.tag
        }
    }

    pub fn standing(&self) -> Standing {
        Standing {
            division: self.division,
            subdivision: self.subdivision,
            rating: self.rating,
            rookie: self.is_rookie()
        }
    }
}

/// A participant's standing as it was when their entry was registered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Standing {
    pub division: u32,
    pub subdivision: Subdivision,
    pub rating: f64,
    pub rookie: bool
}

/// One submission line as read from the event file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Submission {
    pub line: usize,
    pub user: Option<String>,
    pub tag: Option<String>,
    pub country: Option<String>,
    pub time: Option<TimeValue>,
    pub splits: Vec<TimeValue>,
    pub disqualification: Disqualification
}

impl Submission {
    pub fn split_total(&self) -> TimeValue {
        self.splits.iter().copied().sum()
    }

    /// The lap time and review state this submission should be rated with.
    ///
    /// A missing total is taken from the splits; a total that contradicts
    /// non-zero splits is a [`Disqualification::TimeError`].
    pub fn resolve(&self) -> (TimeValue, Disqualification) {
        let splits = self.split_total();

        match self.time {
            Some(time) if !time.is_zero() => {
                if !splits.is_zero() && splits != time {
                    (time, Disqualification::TimeError)
                } else {
                    (time, self.disqualification)
                }
            }
            _ => (splits, self.disqualification)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Entry {
    pub player_id: u32,
    pub name: String,
    pub tag: String,
    pub time: TimeValue,
    pub splits: Vec<TimeValue>,
    pub disqualification: Disqualification,
    pub standing: Standing,
    pub provisional_division: u32,
    pub subdivision: Subdivision,
    pub rating: f64,
    pub handicap_delta: f64,
    /// Place within the entry's division
    pub place: Option<u32>,
    pub overall_place: Option<u32>,
    pub handicap_place: Option<u32>,
    pub points: u32
}

impl Entry {
    pub fn new(player: &Player, time: TimeValue, splits: &[TimeValue], disqualification: Disqualification) -> Entry {
        Entry {
            player_id: player.id,
            name: player.name.clone(),
            tag: player.tag.clone(),
            time,
            splits: splits.iter().copied().take(MAX_SPLITS).collect(),
            disqualification,
            standing: player.standing(),
            ..Default::default()
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.disqualification.is_eligible()
    }

    /// The assigned division, or the provisional one while unassigned.
    pub fn division(&self) -> u32 {
        if self.standing.division > 0 {
            self.standing.division
        } else {
            self.provisional_division
        }
    }

    pub fn is_rated(&self) -> bool {
        self.standing.rating > 0.0
    }

    pub fn display_name(&self) -> &str {
        if self.tag.is_empty() {
            &self.name
        } else {
            &self.tag
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventConfig {
    pub week: u32,
    pub season: u32,
    pub season_race: u32,
    pub status: EventStatus,
    pub car: String,
    pub track: String,
    pub description: String,
    pub comment: String,
    pub curve: ParCurve,
    pub squeeze: f64,
    pub scoot: f64,
    pub weight: f64,
    pub auto_squeeze: bool,
    pub auto_scoot: bool
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            week: EVENT_QUALIFIER,
            season: 0,
            season_race: 0,
            status: EventStatus::None,
            car: String::new(),
            track: String::new(),
            description: String::new(),
            comment: "Good job everyone!".to_string(),
            curve: ParCurve::default(),
            squeeze: DEFAULT_SQUEEZE,
            scoot: DEFAULT_SCOOT,
            weight: DEFAULT_WEIGHT,
            auto_squeeze: true,
            auto_scoot: true
        }
    }
}

impl EventConfig {
    pub fn is_qualifier(&self) -> bool {
        self.week == EVENT_QUALIFIER
    }

    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }

    /// A manual squeeze turns auto-squeeze off. Non-positive values fall back
    /// to the default and return `false`.
    pub fn set_squeeze(&mut self, squeeze: f64) -> bool {
        self.auto_squeeze = false;
        if squeeze > 0.0 {
            self.squeeze = squeeze;
            true
        } else {
            self.squeeze = DEFAULT_SQUEEZE;
            false
        }
    }

    pub fn set_scoot(&mut self, scoot: f64) {
        self.auto_scoot = false;
        self.scoot = scoot;
    }

    /// Negative weights fall back to the default and return `false`.
    pub fn set_weight(&mut self, weight: f64) -> bool {
        if weight >= 0.0 {
            self.weight = weight;
            true
        } else {
            self.weight = DEFAULT_WEIGHT;
            false
        }
    }
}

/// Counts of entries under, at and over their handicap. For the qualifier the
/// same three slots tally gold, silver and bronze finishes instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PerformanceBuckets {
    pub under: u32,
    pub at: u32,
    pub over: u32
}

impl PerformanceBuckets {
    /// Anything within half a subdivision of the handicap counts as at handicap.
    pub fn record(&mut self, handicap_delta: f64) {
        let band = SUB_DIVISION_RANGE * 0.5;
        if handicap_delta <= -band {
            self.under += 1;
        } else if handicap_delta >= band {
            self.over += 1;
        } else {
            self.at += 1;
        }
    }

    pub fn tally(&mut self, subdivision: Subdivision) {
        match subdivision {
            Subdivision::Gold => self.under += 1,
            Subdivision::Silver => self.at += 1,
            Subdivision::Bronze => self.over += 1
        }
    }

    pub fn total(&self) -> u32 {
        self.under + self.at + self.over
    }

    pub fn reset(&mut self) {
        *self = PerformanceBuckets::default();
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DivisionStat {
    pub division: u32,
    pub count: u32,
    pub mean: TimeValue,
    pub std_dev: f64,
    pub par: TimeValue,
    pub gold: TimeValue,
    pub silver: TimeValue,
    pub bronze: TimeValue,
    pub quality_count: u32,
    pub quality_mean: TimeValue,
    pub quality_std_dev: f64,
    pub performance: PerformanceBuckets,
    pub handicap_delta: f64
}

impl DivisionStat {
    pub fn new(division: u32) -> DivisionStat {
        DivisionStat {
            division,
            ..Default::default()
        }
    }

    /// Start and end of the bracket a subdivision rates against.
    pub fn bracket(&self, subdivision: Subdivision) -> (TimeValue, TimeValue) {
        match subdivision {
            Subdivision::Gold => (self.par, self.gold),
            Subdivision::Silver => (self.gold, self.silver),
            Subdivision::Bronze => (self.silver, self.bronze)
        }
    }

    pub fn subdivision_of(&self, time: TimeValue) -> Subdivision {
        if time < self.gold {
            Subdivision::Gold
        } else if time < self.silver {
            Subdivision::Silver
        } else {
            Subdivision::Bronze
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OverallStat {
    pub count: u32,
    pub mean: TimeValue,
    pub std_dev: f64,
    pub quality_count: u32,
    pub quality_mean: TimeValue,
    pub quality_std_dev: f64,
    pub handicap_delta: f64
}

#[cfg(test)]
mod tests {
    use super::{DivisionStat, EventConfig, PerformanceBuckets, Player, Submission};
    use crate::model::structures::{
        disqualification::Disqualification, event_status::EventStatus, subdivision::Subdivision,
        time_value::TimeValue
    };

    #[test]
    fn test_rookie_status() {
        let mut player = Player::new(1, "user", "tag");
        assert!(player.is_rookie());

        player.total_weight = 3.0;
        player.verified_count = 2.0;
        assert!(player.is_rookie());

        player.verified_count = 3.0;
        assert!(!player.is_rookie());

        let mut qualified = Player::new(2, "user", "tag");
        qualified.qualifier.status = EventStatus::Final;
        assert!(!qualified.is_rookie());
    }

    #[test]
    fn test_submission_takes_split_total() {
        let submission = Submission {
            splits: vec![TimeValue::from_millis(30_000), TimeValue::from_millis(31_500)],
            ..Default::default()
        };

        assert_eq!(
            submission.resolve(),
            (TimeValue::from_millis(61_500), Disqualification::Ok)
        );
    }

    #[test]
    fn test_submission_split_mismatch() {
        let submission = Submission {
            time: Some(TimeValue::from_millis(61_000)),
            splits: vec![TimeValue::from_millis(30_000), TimeValue::from_millis(31_500)],
            disqualification: Disqualification::Verified,
            ..Default::default()
        };

        assert_eq!(
            submission.resolve(),
            (TimeValue::from_millis(61_000), Disqualification::TimeError)
        );
    }

    #[test]
    fn test_manual_overrides_disable_auto_tuning() {
        let mut event = EventConfig::default();
        assert!(event.auto_squeeze && event.auto_scoot);

        assert!(!event.set_squeeze(-1.0));
        assert_eq!(event.squeeze, 1.2);
        assert!(!event.auto_squeeze);

        event.set_scoot(0.5);
        assert!(!event.auto_scoot);

        assert!(!event.set_weight(-2.0));
        assert_eq!(event.weight, 1.0);
    }

    #[test]
    fn test_performance_buckets() {
        let mut buckets = PerformanceBuckets::default();
        buckets.record(-0.2);
        buckets.record(0.0);
        buckets.record(1.0 / 6.0);
        buckets.record(0.1);

        assert_eq!(buckets.under, 1);
        assert_eq!(buckets.at, 2);
        assert_eq!(buckets.over, 1);
    }

    #[test]
    fn test_subdivision_uses_strict_thresholds() {
        let stat = DivisionStat {
            gold: TimeValue::from_millis(60_000),
            silver: TimeValue::from_millis(61_000),
            ..DivisionStat::new(1)
        };

        assert_eq!(stat.subdivision_of(TimeValue::from_millis(59_999)), Subdivision::Gold);
        assert_eq!(stat.subdivision_of(TimeValue::from_millis(60_000)), Subdivision::Silver);
        assert_eq!(stat.subdivision_of(TimeValue::from_millis(61_000)), Subdivision::Bronze);
    }
}
