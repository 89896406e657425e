//! Pure, synchronous list filtering over already-fetched records.
//!
//! Every function here is deterministic and side-effect free: re-running a
//! filter over the same inputs yields the same ordered subsequence, so
//! callers may re-derive the visible list as often as they like.

use shared::{
    domain::YesNo,
    protocol::{Allowance, Candidate, Deduction, Employee, TaxBracket},
};

/// Case-insensitive substring containment; the empty term matches everything.
pub fn matches_search(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&term.to_lowercase())
}

/// The single field free-text search runs against for a record kind.
pub trait Searchable {
    fn display_field(&self) -> &str;
}

impl Searchable for Allowance {
    fn display_field(&self) -> &str {
        &self.name
    }
}

impl Searchable for Deduction {
    fn display_field(&self) -> &str {
        &self.name
    }
}

impl Searchable for Candidate {
    fn display_field(&self) -> &str {
        &self.name
    }
}

impl Searchable for TaxBracket {
    fn display_field(&self) -> &str {
        &self.tax_rate
    }
}

/// A set of optional constraints over one record kind. Unset criteria are
/// vacuously true; `is_active` reports whether any constraint is set so the
/// presentation layer can disable "Apply Filter" when none is.
pub trait Criteria<R> {
    fn is_active(&self) -> bool;
    fn matches(&self, record: &R) -> bool;
}

/// The absence of structured criteria (kinds that only support text search).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoCriteria;

impl<R> Criteria<R> for NoCriteria {
    fn is_active(&self) -> bool {
        false
    }

    fn matches(&self, _record: &R) -> bool {
        true
    }
}

/// Applies search term and criteria with AND semantics, preserving input
/// order and never deduplicating.
pub fn apply<R, C>(records: &[R], criteria: &C, search_term: &str) -> Vec<R>
where
    R: Searchable + Clone,
    C: Criteria<R>,
{
    records
        .iter()
        .filter(|record| matches_search(record.display_field(), search_term))
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

/// Named amount buckets offered by the allowance and deduction filters.
/// 1000 and 5000 both belong to the middle bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRange {
    LessThan1000,
    From1000To5000,
    MoreThan5000,
}

impl AmountRange {
    pub fn contains(self, amount: f64) -> bool {
        match self {
            AmountRange::LessThan1000 => amount < 1000.0,
            AmountRange::From1000To5000 => (1000.0..=5000.0).contains(&amount),
            AmountRange::MoreThan5000 => amount > 5000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AllowanceCriteria {
    pub taxable: Option<YesNo>,
    pub fixed: Option<YesNo>,
    pub one_time: Option<YesNo>,
    pub amount: Option<AmountRange>,
}

impl Criteria<Allowance> for AllowanceCriteria {
    fn is_active(&self) -> bool {
        self.taxable.is_some()
            || self.fixed.is_some()
            || self.one_time.is_some()
            || self.amount.is_some()
    }

    fn matches(&self, record: &Allowance) -> bool {
        if let Some(taxable) = self.taxable {
            if record.taxable != taxable {
                return false;
            }
        }
        if let Some(fixed) = self.fixed {
            if record.fixed != fixed.as_bool() {
                return false;
            }
        }
        if let Some(one_time) = self.one_time {
            if record.one_time != one_time {
                return false;
            }
        }
        if let Some(range) = self.amount {
            if !range.contains(record.amount) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeductionCriteria {
    pub taxable: Option<YesNo>,
    pub fixed: Option<YesNo>,
    pub one_time_deduction: Option<YesNo>,
    pub amount: Option<AmountRange>,
}

impl Criteria<Deduction> for DeductionCriteria {
    fn is_active(&self) -> bool {
        self.taxable.is_some()
            || self.fixed.is_some()
            || self.one_time_deduction.is_some()
            || self.amount.is_some()
    }

    fn matches(&self, record: &Deduction) -> bool {
        if let Some(taxable) = self.taxable {
            if record.taxable != taxable {
                return false;
            }
        }
        if let Some(fixed) = self.fixed {
            if record.fixed != fixed.as_bool() {
                return false;
            }
        }
        if let Some(one_time) = self.one_time_deduction {
            if record.one_time_deduction != one_time {
                return false;
            }
        }
        if let Some(range) = self.amount {
            if !range.contains(record.amount) {
                return false;
            }
        }
        true
    }
}

/// Employee picker search matches on name or role.
pub fn search_employees(employees: &[Employee], term: &str) -> Vec<Employee> {
    employees
        .iter()
        .filter(|employee| {
            matches_search(&employee.name, term) || matches_search(&employee.role, term)
        })
        .cloned()
        .collect()
}
