//! Turning a season of forecast records into one grade per competitor per city.
//!
//! Grades are computed per (school, year, semester, city) group. The engine only reads its
//! inputs; anything worth telling the user comes back as [`GradeNote`] values alongside the
//! rows instead of being logged from here.

use crate::{
    record::{CompetitorKind, Record, Semester},
    table::{ForecastTable, KeyField, KeyValue, Order},
    util::round2,
    verification::VerificationLookup,
};
use chrono::NaiveDate;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

pub mod baseline;
pub mod climo;

pub use self::baseline::{Baseline, BaselineSource};

/// Constants of the grading policy.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GradePolicy {
    /// Misses per city that cost nothing.
    pub miss_allowed: u32,
    /// Contest days per city.
    pub fcst_per_city: u32,
    /// How many national standard deviations behind climatology must be before losing to it
    /// costs points.
    pub climo_sigma: f64,
}

impl Default for GradePolicy {
    fn default() -> Self {
        GradePolicy {
            miss_allowed: 2,
            fcst_per_city: 8,
            climo_sigma: 3.0,
        }
    }
}

impl GradePolicy {
    pub fn required(&self) -> u32 {
        self.fcst_per_city.saturating_sub(self.miss_allowed)
    }

    /// Points lost per miss beyond the allowance.
    pub fn miss_penalty(&self) -> f64 {
        100.0 / f64::from(self.required().max(1))
    }

    /// Points lost per day beaten by climatology.
    pub fn climo_penalty(&self) -> f64 {
        30.0 / f64::from(self.required().max(1))
    }
}

/// One forecast city for one school and season.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Station {
    pub school: String,
    pub year: i32,
    pub semester: Semester,
    pub identifier: String,
}

impl Station {
    pub fn of(rec: &Record) -> Self {
        Station {
            school: rec.school().to_owned(),
            year: rec.year(),
            semester: rec.semester(),
            identifier: rec.identifier().to_owned(),
        }
    }

    fn national_key(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::Int(i64::from(self.year)),
            KeyValue::Semester(self.semester),
            KeyValue::Text(self.identifier.clone()),
        ]
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.school, self.semester, self.year, self.identifier
        )
    }
}

/// The grade for one competitor at one city.
#[derive(Clone, PartialEq, Debug)]
pub struct GradeRow {
    pub station: Station,
    pub category: u8,
    pub name: String,
    /// Forecasts actually submitted.
    pub forecasts: i32,
    pub absence_penalty: f64,
    /// Vacation days the competitor did forecast on anyway.
    pub vacation_exempt: u32,
    pub climo_penalty: f64,
    pub school_bonus: f64,
    pub national_bonus: f64,
    pub score: f64,
}

/// Something the caller should know about a grading run.
#[derive(Clone, PartialEq, Debug)]
pub enum GradeNote {
    /// There was nothing to grade.
    NoForecasts,
    /// The national rows do not cover the same cities as the forecasts, so climatology was
    /// ignored for the whole run.
    ModelMismatch {
        forecaster_groups: usize,
        model_groups: usize,
    },
    /// No consensus row and nothing to synthesize one from; school bonuses are zero.
    NoBaseline(Station),
    /// Every competitor finished with the same error; school bonuses are zero.
    ZeroSpread(Station),
    /// The school baseline was rebuilt from verification data.
    SynthesizedBaseline { station: Station, error: f64 },
    /// Days inside a vacation were excused.
    VacationExcused {
        station: Station,
        name: String,
        days: u32,
    },
}

impl GradeNote {
    pub fn is_warning(&self) -> bool {
        match self {
            GradeNote::SynthesizedBaseline { .. } | GradeNote::VacationExcused { .. } => false,
            _ => true,
        }
    }
}

impl fmt::Display for GradeNote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GradeNote::NoForecasts => write!(f, "no forecasts found, nothing to grade"),
            GradeNote::ModelMismatch {
                forecaster_groups,
                model_groups,
            } => write!(
                f,
                "forecaster and model data mismatch ({} vs {} cities), climatology disabled",
                forecaster_groups, model_groups
            ),
            GradeNote::NoBaseline(station) => {
                write!(f, "no school baseline available for {}", station)
            }
            GradeNote::ZeroSpread(station) => {
                write!(f, "no spread in cumulative errors for {}", station)
            }
            GradeNote::SynthesizedBaseline { station, error } => write!(
                f,
                "synthesized school baseline for {} from verification: {:.2}",
                station, error
            ),
            GradeNote::VacationExcused {
                station,
                name,
                days,
            } => write!(f, "excused {} vacation days for {} at {}", days, name, station),
        }
    }
}

/// The output of a grading run.
#[derive(Clone, Debug, Default)]
pub struct GradeSheet {
    pub rows: Vec<GradeRow>,
    pub notes: Vec<GradeNote>,
}

impl GradeSheet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GradeNote> {
        self.notes.iter().filter(|n| n.is_warning())
    }
}

/// Computes grades for a season of forecasts.
///
/// ```ignore
/// let sheet = GradingEngine::new(GradePolicy::default())
///     .with_model(&national)
///     .with_verification(&verifs)
///     .with_vacations(&vacations)
///     .calc_grades(&forecasts);
/// ```
#[derive(Clone, Copy)]
pub struct GradingEngine<'a> {
    policy: GradePolicy,
    model: Option<&'a ForecastTable>,
    verification: Option<&'a dyn VerificationLookup>,
    vacations: &'a [(NaiveDate, NaiveDate)],
}

impl<'a> GradingEngine<'a> {
    pub fn new(policy: GradePolicy) -> Self {
        GradingEngine {
            policy,
            model: None,
            verification: None,
            vacations: &[],
        }
    }

    /// National rows (school `xxx`) used for the climatology comparison.
    pub fn with_model(self, model: &'a ForecastTable) -> Self {
        Self {
            model: Some(model),
            ..self
        }
    }

    /// Verification used to build a school baseline when there is no consensus row.
    pub fn with_verification(self, verification: &'a dyn VerificationLookup) -> Self {
        Self {
            verification: Some(verification),
            ..self
        }
    }

    /// Inclusive date ranges where misses are excused.
    pub fn with_vacations(self, vacations: &'a [(NaiveDate, NaiveDate)]) -> Self {
        Self { vacations, ..self }
    }

    pub fn calc_grades(&self, forecasts: &ForecastTable) -> GradeSheet {
        let mut sheet = GradeSheet::default();

        if forecasts.is_empty() {
            sheet.notes.push(GradeNote::NoForecasts);
            return sheet;
        }

        let model_groups = self.model.and_then(|model| {
            let forecaster_groups = forecasts
                .unique_combinations(&KeyField::STATION, Order::Sorted)
                .len();
            let model_groups = model
                .unique_combinations(&KeyField::NATIONAL_STATION, Order::Sorted)
                .len();

            if forecaster_groups != model_groups {
                sheet.notes.push(GradeNote::ModelMismatch {
                    forecaster_groups,
                    model_groups,
                });
                None
            } else {
                Some(model.group_by(&KeyField::NATIONAL_STATION))
            }
        });

        let mut stations: Vec<(Station, Vec<&Record>)> = forecasts
            .group_by(&KeyField::STATION)
            .into_iter()
            .filter_map(|(_, rows)| {
                let station = Station::of(rows.first()?);
                Some((station, rows))
            })
            .collect();
        stations.sort_by(|(a, a_rows), (b, b_rows)| {
            let first_date = |rows: &[&Record]| rows.iter().map(|r| r.date()).min();
            (&a.school, a.year, a.semester, first_date(&a_rows[..]), &a.identifier).cmp(&(
                &b.school,
                b.year,
                b.semester,
                first_date(&b_rows[..]),
                &b.identifier,
            ))
        });

        for (station, rows) in stations {
            let climo_rows = model_groups
                .as_ref()
                .and_then(|groups| groups.get(&station.national_key()))
                .map(|model_rows| climo::climatology_series(model_rows));

            self.grade_station(&station, &rows, climo_rows.as_deref(), &mut sheet);
        }

        rescale_school_bonus(&mut sheet.rows);

        sheet
    }

    fn grade_station(
        &self,
        station: &Station,
        rows: &[&Record],
        climo_rows: Option<&[&Record]>,
        sheet: &mut GradeSheet,
    ) {
        let baseline = baseline::school_baseline(rows, self.verification);
        match baseline {
            None => sheet.notes.push(GradeNote::NoBaseline(station.clone())),
            Some(b) => {
                if let BaselineSource::Synthesized = b.source {
                    sheet.notes.push(GradeNote::SynthesizedBaseline {
                        station: station.clone(),
                        error: b.error,
                    });
                }
                if b.spread.is_nan() || b.spread <= 0.0 {
                    sheet.notes.push(GradeNote::ZeroSpread(station.clone()));
                }
            }
        }

        let mut competitors: BTreeMap<(u8, &str), Vec<&Record>> = BTreeMap::new();
        for &rec in rows {
            if rec.kind() != CompetitorKind::Consensus {
                competitors
                    .entry((rec.category(), rec.name()))
                    .or_default()
                    .push(rec);
            }
        }

        for ((category, name), mut days) in competitors {
            days.sort_by_key(|r| r.day());

            let (row, excused) =
                self.grade_competitor(station, category, name, &days, baseline, climo_rows);
            if excused > 0 {
                sheet.notes.push(GradeNote::VacationExcused {
                    station: station.clone(),
                    name: name.to_owned(),
                    days: excused,
                });
            }
            sheet.rows.push(row);
        }
    }

    /// Returns the grade row and the number of days excused for vacation.
    fn grade_competitor(
        &self,
        station: &Station,
        category: u8,
        name: &str,
        days: &[&Record],
        baseline: Option<Baseline>,
        climo_rows: Option<&[&Record]>,
    ) -> (GradeRow, u32) {
        let policy = &self.policy;
        let num_days = days.len() as i64;

        let mut prev_abs = 0;
        let mut missed_days: Vec<u8> = Vec::with_capacity(days.len());
        for rec in days {
            if rec.abs > prev_abs {
                missed_days.push(rec.day());
            }
            prev_abs = prev_abs.max(rec.abs);
        }
        let mut nmiss = i64::from(days.iter().map(|r| r.abs).max().unwrap_or(0));

        // A day covered by more than one interval is only excused once.
        let vacation_days: BTreeSet<u8> = days
            .iter()
            .filter(|r| {
                self.vacations
                    .iter()
                    .any(|&(start, end)| start <= r.date() && r.date() <= end)
            })
            .map(|r| r.day())
            .collect();
        let excused = vacation_days.len() as u32;
        let vacation_exempt = vacation_days
            .iter()
            .filter(|&&day| !missed_days.contains(&day))
            .count() as u32;
        nmiss -= i64::from(excused);
        let nmiss = nmiss.max(0);

        let forecasts = (num_days - nmiss) as i32;
        let absence_penalty =
            -((nmiss - i64::from(policy.miss_allowed)).max(0) as f64) * policy.miss_penalty();

        let last = days[days.len() - 1];
        let err = last.cum_err.total;

        let school_bonus = match baseline {
            Some(b) if b.spread > 0.0 => round2(((b.error - err) / b.spread).max(0.0)),
            _ => 0.0,
        };

        let national_bonus = round2(1.0 + (-last.norm_city / 10.0).max(-1.0));

        let climo_penalty = climo_rows
            .and_then(|series| {
                climo::days_beaten_by_climo(days, &missed_days, series, policy.climo_sigma)
            })
            .map(|count| -policy.climo_penalty() * f64::from(count.min(policy.required())))
            .unwrap_or(0.0);

        let row = GradeRow {
            station: station.clone(),
            category,
            name: name.to_owned(),
            forecasts,
            absence_penalty,
            vacation_exempt,
            climo_penalty,
            school_bonus,
            national_bonus,
            score: 100.0 + absence_penalty + climo_penalty,
        };

        (row, excused)
    }
}

/// Divide the school bonus column by its maximum so the best competitor gets 1.0.
fn rescale_school_bonus(rows: &mut [GradeRow]) {
    let max = rows.iter().map(|r| r.school_bonus).fold(0.0, f64::max);
    if max > 0.0 {
        for row in rows {
            row.school_bonus = round2(row.school_bonus / max);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = GradePolicy::default();
        assert_eq!(policy.required(), 6);
        assert!((policy.miss_penalty() - 100.0 / 6.0).abs() < 1.0e-12);
        assert!((policy.climo_penalty() - 5.0).abs() < 1.0e-12);
    }

    #[test]
    fn test_rescale_school_bonus() {
        let station = Station {
            school: "tam".to_owned(),
            year: 2019,
            semester: Semester::Fall,
            identifier: "KPDX".to_owned(),
        };
        let row = |bonus: f64| GradeRow {
            station: station.clone(),
            category: 3,
            name: "x".to_owned(),
            forecasts: 8,
            absence_penalty: 0.0,
            vacation_exempt: 0,
            climo_penalty: 0.0,
            school_bonus: bonus,
            national_bonus: 0.0,
            score: 100.0,
        };

        let mut rows = vec![row(0.0), row(0.5), row(1.5)];
        rescale_school_bonus(&mut rows);
        let bonuses: Vec<f64> = rows.iter().map(|r| r.school_bonus).collect();
        assert_eq!(bonuses, vec![0.0, 0.33, 1.0]);

        let mut rows = vec![row(0.0), row(0.0)];
        rescale_school_bonus(&mut rows);
        assert!(rows.iter().all(|r| r.school_bonus == 0.0));
    }

    #[test]
    fn test_note_levels() {
        assert!(GradeNote::NoForecasts.is_warning());
        assert!(GradeNote::ModelMismatch {
            forecaster_groups: 3,
            model_groups: 2
        }
        .to_string()
        .contains("3 vs 2"));
    }
}
