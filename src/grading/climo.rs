//! Counting the days a competitor lost to an easily beaten climatology forecast.
use crate::record::{CompetitorKind, Record};
use std::collections::HashMap;

/// Climatology series names, in order of preference.
pub const CLIMO_SERIES: [&str; 2] = ["CLIMO_", "CLIMO0"];

/// Pick the climatology rows out of the national rows for one city, sorted by day.
pub fn climatology_series<'a>(model_rows: &[&'a Record]) -> Vec<&'a Record> {
    for series in CLIMO_SERIES.iter() {
        let mut rows: Vec<&Record> = model_rows
            .iter()
            .cloned()
            .filter(|r| r.kind() == CompetitorKind::Climatology && r.name() == *series)
            .collect();

        if !rows.is_empty() {
            rows.sort_by_key(|r| r.day());
            return rows;
        }
    }

    vec![]
}

/// Number of days the competitor forecast, climatology had the lower daily error, and
/// climatology itself was more than `sigma` national standard deviations behind.
///
/// `missed` holds the contest days the competitor missed. Days are matched by day number,
/// so the order of either slice does not matter. Returns `None` when the climatology days
/// are not exactly the competitor's days.
pub fn days_beaten_by_climo(
    competitor: &[&Record],
    missed: &[u8],
    climo: &[&Record],
    sigma: f64,
) -> Option<u32> {
    if climo.len() != competitor.len() {
        return None;
    }

    let climo_by_day: HashMap<u8, &Record> = climo.iter().map(|&r| (r.day(), r)).collect();
    if climo_by_day.len() != climo.len() {
        return None;
    }

    let mut count = 0;
    for rec in competitor {
        let climo_rec = climo_by_day.get(&rec.day())?;
        if missed.contains(&rec.day()) {
            continue;
        }

        if climo_rec.err.total < rec.err.total && climo_rec.norm_city / 10.0 > sigma {
            count += 1;
        }
    }

    Some(count)
}
