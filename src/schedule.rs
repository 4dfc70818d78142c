//! Which city is being forecast on which date.
use crate::{error::WxErr, record::Semester};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// One city's two week forecast window.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ScheduleEntry {
    pub city: String,
    pub state: String,
    pub ident: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScheduleEntry {
    /// The season an entry belongs to is decided by its end date.
    pub fn season(&self) -> (Semester, i32) {
        (Semester::for_date(self.end), self.end.year())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Contest day number (1-8) for a date inside this window.
    ///
    /// Forecasts are made Monday through Thursday of two consecutive weeks, so the Friday,
    /// Saturday and Sunday between them are not contest days.
    pub fn day_for_date(&self, date: NaiveDate) -> Option<u8> {
        if !self.contains(date) {
            return None;
        }

        let raw = (date - self.start).num_days() + 1;
        let day = match raw {
            // the weekend between the two forecast weeks; a raw 7 would alias day 4
            5 | 6 | 7 => return None,
            d if d > 7 => d % 7 + 4,
            d => d,
        };

        if day >= 9 || day < 1 {
            None
        } else {
            Some(day as u8)
        }
    }

    /// Calendar date of a contest day in this window.
    pub fn date_for_day(&self, day: u8) -> Option<NaiveDate> {
        if !(1..=8).contains(&day) {
            return None;
        }
        let day = i64::from(day);
        let week = if day > 4 { 7 } else { 0 };
        let offset = week + (day - 1) % 4;

        Some(self.start + Duration::days(offset))
    }

    /// All contest dates in this window, in day order.
    pub fn contest_dates(&self) -> Vec<NaiveDate> {
        (1..=8).filter_map(|day| self.date_for_day(day)).collect()
    }
}

/// Schedule entries grouped by season and keyed by station identifier.
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    seasons: BTreeMap<(i32, Semester), HashMap<String, ScheduleEntry>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn add(&mut self, entry: ScheduleEntry) {
        let (semester, year) = entry.season();
        self.seasons
            .entry((year, semester))
            .or_default()
            .insert(entry.ident.clone(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// Entries for a season ordered by start date.
    pub fn season(&self, semester: Semester, year: i32) -> Result<Vec<&ScheduleEntry>, WxErr> {
        let cities = self
            .seasons
            .get(&(year, semester))
            .filter(|cities| !cities.is_empty())
            .ok_or(WxErr::ScheduleNotFound { semester, year })?;

        let mut entries: Vec<&ScheduleEntry> = cities.values().collect();
        entries.sort_by_key(|e| (e.start, e.ident.clone()));

        Ok(entries)
    }

    pub fn seasons(&self) -> impl Iterator<Item = (Semester, i32)> + '_ {
        self.seasons.keys().map(|&(year, semester)| (semester, year))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.seasons.values().flat_map(|cities| cities.values())
    }

    /// The city being forecast on a date and the contest day number, if any.
    pub fn ident_day(&self, date: NaiveDate) -> Option<(&ScheduleEntry, u8)> {
        self.entries()
            .filter_map(|entry| entry.day_for_date(date).map(|day| (entry, day)))
            .next()
    }

    /// The most recent end date that is not after `today`.
    pub fn latest(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.entries().map(|e| e.end).filter(|&end| end <= today).max()
    }
}

impl std::iter::FromIterator<ScheduleEntry> for Schedule {
    fn from_iter<I: IntoIterator<Item = ScheduleEntry>>(iter: I) -> Self {
        let mut schedule = Schedule::new();
        for entry in iter {
            schedule.add(entry);
        }
        schedule
    }
}
