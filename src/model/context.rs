use crate::model::{
    constants::DIV_COUNT,
    db_structs::{DivisionStat, Entry, EventConfig, OverallStat}
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DqFilter {
    All,
    #[default]
    Eligible,
    Disqualified
}

/// Which entries a pass walks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFilter {
    /// `None` for every division
    pub division: Option<u32>,
    pub dq: DqFilter
}

impl EntryFilter {
    pub fn eligible() -> EntryFilter {
        EntryFilter::default()
    }

    pub fn all() -> EntryFilter {
        EntryFilter {
            division: None,
            dq: DqFilter::All
        }
    }

    pub fn division(division: u32) -> EntryFilter {
        EntryFilter {
            division: Some(division),
            dq: DqFilter::Eligible
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let dq_match = match self.dq {
            DqFilter::All => true,
            DqFilter::Eligible => entry.is_eligible(),
            DqFilter::Disqualified => !entry.is_eligible()
        };

        dq_match && self.division.map_or(true, |d| entry.division() == d)
    }
}

/// Everything one event run owns: the event settings, its entries in time
/// order, and the statistics the passes accumulate.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub event: EventConfig,
    pub entries: Vec<Entry>,
    pub overall: OverallStat,
    /// Indexed by division, `0..=DIV_COUNT`
    pub divisions: Vec<DivisionStat>
}

impl EventContext {
    pub fn new(event: EventConfig) -> EventContext {
        EventContext {
            event,
            entries: Vec::new(),
            overall: OverallStat::default(),
            divisions: (0..=DIV_COUNT).map(DivisionStat::new).collect()
        }
    }

    /// Stable sort by lap time; entries with equal times keep submission order.
    pub fn sort_by_time(&mut self) {
        self.entries.sort_by_key(|e| e.time);
    }

    pub fn select(&self, filter: EntryFilter) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter().filter(move |e| filter.matches(e))
    }

    pub fn select_mut(&mut self, filter: EntryFilter) -> impl Iterator<Item = &mut Entry> + '_ {
        self.entries.iter_mut().filter(move |e| filter.matches(e))
    }

    pub fn entries_where<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Entry> + 'a
    where
        P: Fn(&Entry) -> bool + 'a
    {
        self.entries.iter().filter(move |e| predicate(e))
    }

    pub fn division(&self, division: u32) -> Option<&DivisionStat> {
        self.divisions.get(division as usize)
    }

    pub fn entry_for(&self, player_id: u32) -> Option<&Entry> {
        self.entries.iter().find(|e| e.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{DqFilter, EntryFilter, EventContext};
    use crate::{
        model::{
            constants::DIV_COUNT,
            db_structs::EventConfig,
            structures::{disqualification::Disqualification, time_value::TimeValue}
        },
        utils::test_utils::generate_entry
    };

    #[test]
    fn test_new_context_has_every_division() {
        let ctx = EventContext::new(EventConfig::default());
        assert_eq!(ctx.divisions.len(), DIV_COUNT as usize + 1);
        assert_eq!(ctx.division(3).map(|d| d.division), Some(3));
    }

    #[test]
    fn test_sort_is_stable() {
        let mut ctx = EventContext::new(EventConfig::default());
        ctx.entries.push(generate_entry(1, 62_000));
        ctx.entries.push(generate_entry(2, 61_000));
        ctx.entries.push(generate_entry(3, 62_000));
        ctx.sort_by_time();

        let ids: Vec<u32> = ctx.entries.iter().map(|e| e.player_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_filters() {
        let mut ctx = EventContext::new(EventConfig::default());
        let mut dq = generate_entry(1, 60_000);
        dq.disqualification = Disqualification::Contact;
        let mut assigned = generate_entry(2, 61_000);
        assigned.standing.division = 2;
        let mut provisional = generate_entry(3, 62_000);
        provisional.provisional_division = 2;
        ctx.entries = vec![dq, assigned, provisional];

        assert_eq!(ctx.select(EntryFilter::eligible()).count(), 2);
        assert_eq!(ctx.select(EntryFilter::all()).count(), 3);
        assert_eq!(ctx.select(EntryFilter::division(2)).count(), 2);
        let disqualified = EntryFilter {
            division: None,
            dq: DqFilter::Disqualified
        };
        assert_eq!(ctx.select(disqualified).map(|e| e.player_id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(
            ctx.entries_where(|e| e.time > TimeValue::from_millis(60_500)).count(),
            2
        );
    }
}
