//! The school baseline a competitor's cumulative error is compared against.
use crate::{
    record::{CompetitorKind, ForecastType, Record, CONSENSUS_CATEGORY, CONSENSUS_NAME},
    verification::VerificationLookup,
};
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BaselineSource {
    /// The school consensus row recorded by the contest.
    Consensus,
    /// Rebuilt from the mean human forecast and the verification data.
    Synthesized,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Baseline {
    pub error: f64,
    pub spread: f64,
    pub source: BaselineSource,
}

/// Work out the baseline error and spread for one school's rows at one city.
///
/// Returns `None` when there is no consensus row and no day could be synthesized.
pub fn school_baseline(
    rows: &[&Record],
    verification: Option<&dyn VerificationLookup>,
) -> Option<Baseline> {
    let consensus: Vec<&Record> = rows
        .iter()
        .cloned()
        .filter(|r| r.name() == CONSENSUS_NAME)
        .collect();

    let (error, last_day, source) = if let Some(last) = consensus.iter().max_by_key(|r| r.day()) {
        (last.cum_err.total, last.day(), BaselineSource::Consensus)
    } else {
        let error = synthesize(rows, verification?)?;
        let last_day = rows.iter().map(|r| r.day()).max()?;
        (error, last_day, BaselineSource::Synthesized)
    };

    let finals: Vec<f64> = rows
        .iter()
        .filter(|r| r.day() == last_day && r.category() < CONSENSUS_CATEGORY)
        .map(|r| r.cum_err.total)
        .collect();

    Some(Baseline {
        error,
        spread: population_std(&finals),
        source,
    })
}

/// Total error of the mean human forecast over the days that have both human forecasts and
/// a verification.
fn synthesize(rows: &[&Record], verification: &dyn VerificationLookup) -> Option<f64> {
    let mut by_day: BTreeMap<u8, Vec<&Record>> = BTreeMap::new();
    for &rec in rows {
        if rec.kind() == CompetitorKind::Human && rec.fcst_type == ForecastType::Human {
            by_day.entry(rec.day()).or_default().push(rec);
        }
    }

    let day_errors: Vec<f64> = by_day
        .values()
        .filter_map(|day_rows| {
            let verif = verification.lookup(day_rows[0].date())?;

            let max = mean(day_rows, |r| f64::from(r.max));
            let min = mean(day_rows, |r| f64::from(r.min));
            let wind = mean(day_rows, |r| f64::from(r.wind));
            let precip = mean(day_rows, |r| r.precip);

            Some(
                (max - f64::from(verif.max)).abs()
                    + (min - f64::from(verif.min)).abs()
                    + 0.5 * (wind - f64::from(verif.wind)).abs()
                    + precip_error(precip, verif.precip),
            )
        })
        .collect();

    if day_errors.is_empty() {
        None
    } else {
        Some(day_errors.iter().sum())
    }
}

fn mean<F: Fn(&Record) -> f64>(rows: &[&Record], f: F) -> f64 {
    rows.iter().map(|&r| f(r)).sum::<f64>() / rows.len() as f64
}

/// Precipitation error points between a forecast and observed amount in inches.
///
/// Every hundredth of an inch between the two costs 0.4 points below 0.10", 0.3 below
/// 0.25", 0.2 below 0.50" and 0.1 above that.
pub fn precip_error(forecast: f64, observed: f64) -> f64 {
    const BANDS: [(f64, f64, f64); 4] = [
        (0.00, 0.10, 0.4),
        (0.10, 0.25, 0.3),
        (0.25, 0.50, 0.2),
        (0.50, f64::INFINITY, 0.1),
    ];

    let lo = forecast.min(observed).max(0.0);
    let hi = forecast.max(observed).max(0.0);

    BANDS
        .iter()
        .map(|&(start, end, rate)| {
            let overlap = hi.min(end) - lo.max(start);
            if overlap > 0.0 {
                overlap * 100.0 * rate
            } else {
                0.0
            }
        })
        .sum()
}

/// Standard deviation with a divisor of `n`; zero for an empty slice.
pub fn population_std(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }

    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    var.sqrt()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::verification::{Verification, VerificationTable};
    use chrono::NaiveDate;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1.0e-9
    }

    fn row(name: &str, category: u8, day: u8, cum_total: f64) -> Record {
        let date = NaiveDate::from_ymd(2019, 9, 8 + u32::from(day));
        let mut rec = Record::new(name, "tam", category, "KPDX", date, day);
        rec.cum_err.total = cum_total;
        rec.fcst_type = ForecastType::Human;
        rec
    }

    #[test]
    fn test_precip_error_bands() {
        assert!(approx(precip_error(0.0, 0.0), 0.0));
        assert!(approx(precip_error(0.0, 0.05), 2.0));
        assert!(approx(precip_error(0.05, 0.0), 2.0));
        assert!(approx(precip_error(0.0, 0.25), 4.0 + 4.5));
        assert!(approx(precip_error(0.20, 0.60), 1.5 + 5.0 + 1.0));
    }

    #[test]
    fn test_population_std() {
        assert!(approx(population_std(&[]), 0.0));
        assert!(approx(population_std(&[3.0, 3.0]), 0.0));
        assert!(approx(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0));
    }

    #[test]
    fn test_consensus_baseline() {
        let recs = vec![
            row("CONSEN", 9, 1, 5.0),
            row("CONSEN", 9, 2, 12.0),
            row("amy", 3, 2, 10.0),
            row("bob", 3, 2, 20.0),
            row("amy", 3, 1, 4.0),
        ];
        let rows: Vec<&Record> = recs.iter().collect();

        let baseline = school_baseline(&rows, None).unwrap();
        assert_eq!(baseline.source, BaselineSource::Consensus);
        assert!(approx(baseline.error, 12.0));
        assert!(approx(baseline.spread, 5.0));
    }

    #[test]
    fn test_synthesized_baseline() {
        let mut amy = row("amy", 3, 1, 0.0);
        amy.max = 70;
        amy.min = 50;
        amy.wind = 10;
        let mut bob = row("bob", 3, 1, 0.0);
        bob.max = 74;
        bob.min = 52;
        bob.wind = 14;
        let mut missed = row("cat", 3, 1, 0.0);
        missed.fcst_type = ForecastType::Missed;
        missed.max = 0;

        let verifs: VerificationTable = vec![Verification {
            city: "Portland".to_owned(),
            state: "OR".to_owned(),
            ident: "KPDX".to_owned(),
            date: amy.date(),
            max: 70,
            min: 50,
            wind: 10,
            precip: 0.0,
        }]
        .into_iter()
        .collect();

        let recs = vec![amy, bob, missed];
        let rows: Vec<&Record> = recs.iter().collect();

        // mean forecast 72/51/12 against 70/50/10
        let baseline = school_baseline(&rows, Some(&verifs)).unwrap();
        assert_eq!(baseline.source, BaselineSource::Synthesized);
        assert!(approx(baseline.error, 2.0 + 1.0 + 1.0));

        let again = school_baseline(&rows, Some(&verifs)).unwrap();
        assert_eq!(baseline, again);

        assert!(school_baseline(&rows, None).is_none());
        assert!(school_baseline(&rows, Some(&VerificationTable::new())).is_none());
    }
}
