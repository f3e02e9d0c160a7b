use serde::{Deserialize, Serialize};

use crate::model::structures::{disqualification::Disqualification, event_status::EventStatus};

/// One participant's recorded outcome for one event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_id: u32,
    pub status: EventStatus,
    pub disqualification: Disqualification,
    pub weight: f64,
    pub rating: f64
}

impl RaceResult {
    pub fn is_recorded(&self) -> bool {
        self.status != EventStatus::None
    }

    /// Final and not disqualified.
    pub fn counts_toward_rating(&self) -> bool {
        self.status.is_final() && self.disqualification.is_eligible()
    }
}
