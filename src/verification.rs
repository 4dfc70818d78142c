//! Observed weather for a contest date.
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, Debug)]
pub struct Verification {
    pub city: String,
    pub state: String,
    pub ident: String,
    pub date: NaiveDate,
    pub max: i32,
    pub min: i32,
    pub wind: i32,
    pub precip: f64,
}

/// Anything that can answer "what actually happened on this date".
pub trait VerificationLookup {
    fn lookup(&self, date: NaiveDate) -> Option<&Verification>;
}

/// Date keyed verification values. A later entry for the same date replaces an earlier one.
#[derive(Clone, Debug, Default)]
pub struct VerificationTable {
    by_date: BTreeMap<NaiveDate, Verification>,
}

impl VerificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, verif: Verification) -> Option<Verification> {
        self.by_date.insert(verif.date, verif)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Verification> {
        self.by_date.values()
    }
}

impl VerificationLookup for VerificationTable {
    fn lookup(&self, date: NaiveDate) -> Option<&Verification> {
        self.by_date.get(&date)
    }
}

impl std::iter::FromIterator<Verification> for VerificationTable {
    fn from_iter<I: IntoIterator<Item = Verification>>(iter: I) -> Self {
        VerificationTable {
            by_date: iter.into_iter().map(|v| (v.date, v)).collect(),
        }
    }
}
