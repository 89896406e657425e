//! Per-screen state: the fetched record list plus the search term and
//! criteria currently applied to it. The visible list is re-derived from
//! those three inputs after every change, so filtering stays repeatable
//! and local edits never require a refetch to show up.

use shared::{
    domain::{AllowanceId, CandidateId, DeductionId, TaxBracketId},
    protocol::{Allowance, Candidate, Deduction, TaxBracket},
};

use crate::filter::{self, AllowanceCriteria, Criteria, DeductionCriteria, NoCriteria, Searchable};

/// Stable id access for records held in a session.
pub trait Identified {
    type Id: Copy + PartialEq;

    fn id(&self) -> Self::Id;
}

impl Identified for Allowance {
    type Id = AllowanceId;

    fn id(&self) -> AllowanceId {
        self.id
    }
}

impl Identified for Deduction {
    type Id = DeductionId;

    fn id(&self) -> DeductionId {
        self.id
    }
}

impl Identified for TaxBracket {
    type Id = TaxBracketId;

    fn id(&self) -> TaxBracketId {
        self.id
    }
}

impl Identified for Candidate {
    type Id = CandidateId;

    fn id(&self) -> CandidateId {
        self.id
    }
}

pub struct ScreenSession<R, C> {
    records: Vec<R>,
    criteria: C,
    search_term: String,
    visible: Vec<R>,
    filters_applied: bool,
}

pub type AllowanceSession = ScreenSession<Allowance, AllowanceCriteria>;
pub type DeductionSession = ScreenSession<Deduction, DeductionCriteria>;
pub type TaxBracketSession = ScreenSession<TaxBracket, NoCriteria>;
pub type CandidateSession = ScreenSession<Candidate, NoCriteria>;

impl<R, C> Default for ScreenSession<R, C>
where
    R: Searchable + Identified + Clone,
    C: Criteria<R> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> ScreenSession<R, C>
where
    R: Searchable + Identified + Clone,
    C: Criteria<R> + Default,
{
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            criteria: C::default(),
            search_term: String::new(),
            visible: Vec::new(),
            filters_applied: false,
        }
    }

    /// Replaces the full record list, typically after a fetch. The current
    /// search term and criteria keep applying to the new list.
    pub fn load(&mut self, records: Vec<R>) {
        self.records = records;
        self.refresh();
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.refresh();
    }

    /// Applying an inactive criteria set is a no-op; the previous filter
    /// state stays in effect.
    pub fn apply_criteria(&mut self, criteria: C) {
        if !criteria.is_active() {
            return;
        }
        self.criteria = criteria;
        self.filters_applied = true;
        self.refresh();
    }

    /// Clears criteria but keeps the search term.
    pub fn reset_criteria(&mut self) {
        self.criteria = C::default();
        self.filters_applied = false;
        self.refresh();
    }

    /// Inserts the record, or replaces the record with the same id.
    pub fn upsert(&mut self, record: R) {
        match self.records.iter().position(|r| r.id() == record.id()) {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
        self.refresh();
    }

    pub fn remove(&mut self, id: R::Id) {
        self.records.retain(|record| record.id() != id);
        self.refresh();
    }

    pub fn visible(&self) -> &[R] {
        &self.visible
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filters_applied(&self) -> bool {
        self.filters_applied
    }

    fn refresh(&mut self) {
        self.visible = filter::apply(&self.records, &self.criteria, &self.search_term);
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::YesNo;

    use super::*;
    use crate::filter::AmountRange;

    fn allowance(id: i64, name: &str, amount: f64, taxable: YesNo) -> Allowance {
        Allowance {
            id: AllowanceId(id),
            code: format!("A{id}"),
            name: name.into(),
            amount,
            one_time: YesNo::No,
            taxable,
            fixed: false,
        }
    }

    #[test]
    fn loaded_records_are_visible_unfiltered() {
        let mut session = AllowanceSession::new();
        session.load(vec![
            allowance(1, "Housing", 2000.0, YesNo::Yes),
            allowance(2, "Travel", 800.0, YesNo::No),
        ]);
        assert_eq!(session.visible().len(), 2);
        assert!(!session.filters_applied());
    }

    #[test]
    fn criteria_and_search_narrow_the_visible_list() {
        let mut session = AllowanceSession::new();
        session.load(vec![
            allowance(1, "Housing", 2000.0, YesNo::Yes),
            allowance(2, "Travel", 800.0, YesNo::No),
            allowance(3, "Hardship", 2000.0, YesNo::No),
        ]);

        session.apply_criteria(AllowanceCriteria {
            taxable: Some(YesNo::Yes),
            amount: Some(AmountRange::From1000To5000),
            ..Default::default()
        });
        assert_eq!(session.visible().len(), 1);
        assert_eq!(session.visible()[0].name, "Housing");

        session.set_search_term("travel");
        assert!(session.visible().is_empty());

        session.reset_criteria();
        assert_eq!(session.visible().len(), 1);
        assert_eq!(session.visible()[0].name, "Travel");
    }

    #[test]
    fn applying_inactive_criteria_changes_nothing() {
        let mut session = AllowanceSession::new();
        session.load(vec![allowance(1, "Housing", 2000.0, YesNo::Yes)]);
        session.apply_criteria(AllowanceCriteria::default());
        assert!(!session.filters_applied());
        assert_eq!(session.visible().len(), 1);
    }

    #[test]
    fn removal_disappears_from_every_view() {
        let mut session = AllowanceSession::new();
        session.load(vec![
            allowance(1, "Housing", 2000.0, YesNo::Yes),
            allowance(2, "Travel", 800.0, YesNo::No),
        ]);
        session.set_search_term("hous");
        assert_eq!(session.visible().len(), 1);

        session.remove(AllowanceId(1));
        assert!(session.visible().is_empty());
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].name, "Travel");
    }

    #[test]
    fn upsert_replaces_matching_id_in_place() {
        let mut session = AllowanceSession::new();
        session.load(vec![
            allowance(1, "Housing", 2000.0, YesNo::Yes),
            allowance(2, "Travel", 800.0, YesNo::No),
        ]);

        session.upsert(allowance(1, "Housing revised", 2400.0, YesNo::Yes));
        assert_eq!(session.records()[0].name, "Housing revised");

        session.upsert(allowance(3, "Medical", 500.0, YesNo::No));
        assert_eq!(session.records().len(), 3);
        assert_eq!(session.records()[2].name, "Medical");
    }
}
