use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{constants::RACE_HISTORY, structures::race_result::RaceResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("race {race_id} is older than every stored race (oldest {oldest})")]
    TooOld { race_id: u32, oldest: u32 }
}

/// What [`HistoryRing::upsert`] did with the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryUpdate {
    Inserted,
    /// The previous result for the same race, now overwritten.
    Replaced(RaceResult),
    /// The oldest result, dropped to make room.
    Evicted(RaceResult)
}

/// Recent race results, newest race first, never more than `RACE_HISTORY` long.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryRing {
    results: Vec<RaceResult>
}

impl HistoryRing {
    pub fn new() -> HistoryRing {
        HistoryRing {
            results: Vec::with_capacity(RACE_HISTORY)
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.results.len() >= RACE_HISTORY
    }

    pub fn get(&self, race_id: u32) -> Option<&RaceResult> {
        self.results.iter().find(|r| r.race_id == race_id)
    }

    pub fn oldest(&self) -> Option<&RaceResult> {
        self.results.last()
    }

    /// Newest race first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RaceResult> {
        self.results.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut RaceResult> {
        self.results.iter_mut()
    }

    /// Stores `result`, replacing a result for the same race. A full ring evicts
    /// its oldest race, unless `result` is older still, in which case nothing changes.
    pub fn upsert(&mut self, result: RaceResult) -> Result<HistoryUpdate, HistoryError> {
        if let Some(existing) = self.results.iter_mut().find(|r| r.race_id == result.race_id) {
            let previous = *existing;
            *existing = result;
            return Ok(HistoryUpdate::Replaced(previous));
        }

        let mut evicted = None;
        if self.is_full() {
            let oldest = self.results.last().map(|r| r.race_id).unwrap_or_default();
            if result.race_id < oldest {
                return Err(HistoryError::TooOld {
                    race_id: result.race_id,
                    oldest
                });
            }
            evicted = self.results.pop();
        }

        let position = self
            .results
            .iter()
            .position(|r| r.race_id < result.race_id)
            .unwrap_or(self.results.len());
        self.results.insert(position, result);

        Ok(match evicted {
            Some(old) => HistoryUpdate::Evicted(old),
            None => HistoryUpdate::Inserted
        })
    }

    /// Appends a result read from the store, keeping the newest-first order.
    /// Results beyond capacity are returned to the caller.
    pub fn load(&mut self, result: RaceResult) -> Result<(), RaceResult> {
        if self.is_full() {
            return Err(result);
        }
        let position = self
            .results
            .iter()
            .position(|r| r.race_id < result.race_id)
            .unwrap_or(self.results.len());
        self.results.insert(position, result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryError, HistoryRing, HistoryUpdate};
    use crate::model::{
        constants::RACE_HISTORY,
        structures::{event_status::EventStatus, race_result::RaceResult}
    };

    fn result(race_id: u32, rating: f64) -> RaceResult {
        RaceResult {
            race_id,
            status: EventStatus::Final,
            rating,
            weight: 1.0,
            ..Default::default()
        }
    }

    fn full_ring(first_id: u32) -> HistoryRing {
        let mut ring = HistoryRing::new();
        for id in first_id..first_id + RACE_HISTORY as u32 {
            ring.upsert(result(id, 1.0)).unwrap();
        }
        ring
    }

    #[test]
    fn test_keeps_newest_first() {
        let mut ring = HistoryRing::new();
        ring.upsert(result(3, 1.0)).unwrap();
        ring.upsert(result(7, 1.0)).unwrap();
        ring.upsert(result(5, 1.0)).unwrap();

        let ids: Vec<u32> = ring.iter().map(|r| r.race_id).collect();
        assert_eq!(ids, vec![7, 5, 3]);
        assert_eq!(ring.oldest().map(|r| r.race_id), Some(3));
    }

    #[test]
    fn test_same_race_replaces() {
        let mut ring = HistoryRing::new();
        ring.upsert(result(4, 1.0)).unwrap();
        let update = ring.upsert(result(4, 2.5)).unwrap();

        assert_eq!(update, HistoryUpdate::Replaced(result(4, 1.0)));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.get(4).map(|r| r.rating), Some(2.5));
    }

    #[test]
    fn test_full_ring_evicts_oldest() {
        let mut ring = full_ring(10);
        let update = ring.upsert(result(40, 1.0)).unwrap();

        assert_eq!(update, HistoryUpdate::Evicted(result(10, 1.0)));
        assert_eq!(ring.len(), RACE_HISTORY);
        assert!(ring.get(10).is_none());
        assert_eq!(ring.iter().next().map(|r| r.race_id), Some(40));
    }

    #[test]
    fn test_full_ring_rejects_older_race() {
        let mut ring = full_ring(10);
        let before = ring.clone();

        assert_eq!(
            ring.upsert(result(2, 1.0)),
            Err(HistoryError::TooOld { race_id: 2, oldest: 10 })
        );
        assert_eq!(ring, before);
    }

    #[test]
    fn test_ring_with_room_accepts_older_race() {
        let mut ring = HistoryRing::new();
        ring.upsert(result(10, 1.0)).unwrap();

        assert_eq!(ring.upsert(result(2, 1.0)), Ok(HistoryUpdate::Inserted));
        assert_eq!(ring.oldest().map(|r| r.race_id), Some(2));
    }

    #[test]
    fn test_load_stops_at_capacity() {
        let mut ring = full_ring(1);
        assert_eq!(ring.load(result(50, 1.0)), Err(result(50, 1.0)));
    }
}
