//! Arranging grade rows into per-class sheets and writing them out.
use crate::{
    error::WxErr,
    grading::GradeRow,
    roster::{Roster, RosterEntry, ALL_CLASS},
    util::round2,
};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

/// Name of the per-class summary sheet.
pub const FINAL_GRADES: &str = "Final_Grades";

/// One competitor at one city.
#[derive(Clone, PartialEq, Debug)]
pub struct ReportRow {
    pub forecaster_id: String,
    pub last_name: String,
    pub first_name: String,
    pub forecasts: i32,
    pub absence_penalty: f64,
    pub vacation_exempt: u32,
    pub climo_penalty: f64,
    pub school_bonus: f64,
    pub national_bonus: f64,
    pub score: f64,
}

/// One competitor summed over every city they appear in.
#[derive(Clone, PartialEq, Debug)]
pub struct FinalRow {
    pub forecaster_id: String,
    pub last_name: String,
    pub first_name: String,
    pub cities: usize,
    pub school_bonus: f64,
    pub national_bonus: f64,
    /// Mean score over the cities.
    pub score: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct CitySheet {
    pub identifier: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ClassReport {
    pub class: String,
    pub cities: Vec<CitySheet>,
    pub final_grades: Vec<FinalRow>,
}

impl ClassReport {
    pub fn city(&self, identifier: &str) -> Option<&CitySheet> {
        self.cities.iter().find(|c| c.identifier == identifier)
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Report {
    pub classes: Vec<ClassReport>,
}

impl Report {
    /// Arrange grade rows by class and city. Every roster class gets a sheet, followed by
    /// `ALL_CLASS`. Grade rows for competitors not on the roster are dropped.
    pub fn build(rows: &[GradeRow], roster: &Roster) -> Self {
        let mut cities: Vec<&str> = vec![];
        for row in rows {
            if !cities.contains(&row.station.identifier.as_str()) {
                cities.push(&row.station.identifier);
            }
        }

        let classes = roster
            .classes()
            .into_iter()
            .chain(std::iter::once(ALL_CLASS))
            .map(|class| {
                let members: Vec<&RosterEntry> = roster.members(class).collect();
                class_report(class, &cities, rows, &members)
            })
            .collect();

        Report { classes }
    }

    pub fn class(&self, class: &str) -> Option<&ClassReport> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Write `<dir>/<class>/<city>.csv` plus a `Final_Grades.csv` for each class. Spaces in
    /// class names become underscores.
    pub fn write_csv(&self, dir: &Path) -> Result<Vec<PathBuf>, WxErr> {
        let mut written = vec![];

        for class in &self.classes {
            let class_dir = dir.join(class.class.replace(' ', "_"));
            fs::create_dir_all(&class_dir)?;

            for city in &class.cities {
                let path = class_dir.join(format!("{}.csv", city.identifier));
                let mut wtr = csv::Writer::from_writer(File::create(&path)?);
                wtr.write_record(&CITY_HEADER)?;
                for row in &city.rows {
                    wtr.write_record(&row.as_strings())?;
                }
                wtr.flush()?;
                written.push(path);
            }

            let path = class_dir.join(format!("{}.csv", FINAL_GRADES));
            let mut wtr = csv::Writer::from_writer(File::create(&path)?);
            wtr.write_record(&FINAL_HEADER)?;
            for row in &class.final_grades {
                wtr.write_record(&row.as_strings())?;
            }
            wtr.flush()?;
            written.push(path);
        }

        Ok(written)
    }
}

pub const CITY_HEADER: [&str; 9] = [
    "Last Name",
    "First Name",
    "Forecasts",
    "Absence",
    "Vacation",
    "Climo",
    "School Bonus",
    "National Bonus",
    "Score",
];

pub const FINAL_HEADER: [&str; 6] = [
    "Last Name",
    "First Name",
    "Cities",
    "School Bonus",
    "National Bonus",
    "Score",
];

impl ReportRow {
    /// Rows sort by last name, then first name, then id.
    fn sort_key(&self) -> (&str, &str, &str) {
        (&self.last_name, &self.first_name, &self.forecaster_id)
    }

    pub fn as_strings(&self) -> Vec<String> {
        vec![
            self.last_name.clone(),
            self.first_name.clone(),
            self.forecasts.to_string(),
            format!("{:.2}", self.absence_penalty),
            self.vacation_exempt.to_string(),
            format!("{:.2}", self.climo_penalty),
            format!("{:.2}", self.school_bonus),
            format!("{:.2}", self.national_bonus),
            format!("{:.2}", self.score),
        ]
    }
}

impl FinalRow {
    fn sort_key(&self) -> (&str, &str, &str) {
        (&self.last_name, &self.first_name, &self.forecaster_id)
    }

    pub fn as_strings(&self) -> Vec<String> {
        vec![
            self.last_name.clone(),
            self.first_name.clone(),
            self.cities.to_string(),
            format!("{:.2}", self.school_bonus),
            format!("{:.2}", self.national_bonus),
            format!("{:.2}", self.score),
        ]
    }
}

fn class_report(
    class: &str,
    cities: &[&str],
    rows: &[GradeRow],
    members: &[&RosterEntry],
) -> ClassReport {
    let mut sheets = vec![];
    for &city in cities {
        let mut city_rows: Vec<ReportRow> = rows
            .iter()
            .filter(|r| r.station.identifier == city)
            .filter_map(|r| {
                members
                    .iter()
                    .find(|m| m.forecaster_id == r.name)
                    .map(|m| report_row(m, r))
            })
            .collect();
        city_rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        sheets.push(CitySheet {
            identifier: city.to_owned(),
            rows: city_rows,
        });
    }

    let mut final_grades: Vec<FinalRow> = members
        .iter()
        .filter_map(|m| {
            let theirs: Vec<&ReportRow> = sheets
                .iter()
                .flat_map(|s| s.rows.iter())
                .filter(|r| r.forecaster_id == m.forecaster_id)
                .collect();

            if theirs.is_empty() {
                return None;
            }

            let n = theirs.len();
            Some(FinalRow {
                forecaster_id: m.forecaster_id.clone(),
                last_name: m.last_name.clone(),
                first_name: m.first_name.clone(),
                cities: n,
                school_bonus: round2(theirs.iter().map(|r| r.school_bonus).sum()),
                national_bonus: round2(theirs.iter().map(|r| r.national_bonus).sum()),
                score: round2(theirs.iter().map(|r| r.score).sum::<f64>() / n as f64),
            })
        })
        .collect();
    final_grades.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    ClassReport {
        class: class.to_owned(),
        cities: sheets,
        final_grades,
    }
}

fn report_row(member: &RosterEntry, row: &GradeRow) -> ReportRow {
    ReportRow {
        forecaster_id: member.forecaster_id.clone(),
        last_name: member.last_name.clone(),
        first_name: member.first_name.clone(),
        forecasts: row.forecasts,
        absence_penalty: row.absence_penalty,
        vacation_exempt: row.vacation_exempt,
        climo_penalty: row.climo_penalty,
        school_bonus: row.school_bonus,
        national_bonus: row.national_bonus,
        score: row.score,
    }
}
