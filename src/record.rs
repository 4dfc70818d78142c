//! One row of forecast contest results and the small vocabularies used to describe it.
use chrono::{Datelike, NaiveDate};
use strum_macros::{AsStaticStr, Display, EnumIter, EnumString};

/// School code used for national models, consensus and climatology.
pub const NATIONAL_SCHOOL: &str = "xxx";

/// Name used for both the school and the national consensus forecasts.
pub const CONSENSUS_NAME: &str = "CONSEN";

pub const GUIDANCE_CATEGORY: u8 = 8;
pub const CONSENSUS_CATEGORY: u8 = 9;

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Display, EnumString, AsStaticStr,
    EnumIter,
)]
pub enum Semester {
    #[strum(to_string = "fall", serialize = "Fall", serialize = "FALL")]
    Fall,
    #[strum(to_string = "spring", serialize = "Spring", serialize = "SPRING")]
    Spring,
}

impl Semester {
    /// Contest seasons run August through December and January through May.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.month() < 8 {
            Semester::Spring
        } else {
            Semester::Fall
        }
    }
}

/// Who produced a row of results.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Display, EnumIter)]
pub enum CompetitorKind {
    Human,
    ModelGuidance,
    Consensus,
    Climatology,
}

impl CompetitorKind {
    pub fn classify(category: u8, name: &str) -> Self {
        if name.to_uppercase().contains("CLIMO") {
            CompetitorKind::Climatology
        } else if name == CONSENSUS_NAME || category == CONSENSUS_CATEGORY {
            CompetitorKind::Consensus
        } else if category == GUIDANCE_CATEGORY {
            CompetitorKind::ModelGuidance
        } else {
            CompetitorKind::Human
        }
    }
}

/// How the forecast for a day was actually made.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ForecastType {
    Missed,
    Human,
    Guidance,
    Climatology,
}

impl ForecastType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "" => ForecastType::Missed,
            "G" | "g" => ForecastType::Guidance,
            "C" | "c" => ForecastType::Climatology,
            _ => ForecastType::Human,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ForecastType::Missed => "",
            ForecastType::Human => "H",
            ForecastType::Guidance => "G",
            ForecastType::Climatology => "C",
        }
    }
}

/// Human readable label for a competitor category.
pub fn category_label(category: u8) -> &'static str {
    const LABELS: [(u8, &str); 7] = [
        (0, "Professional"),
        (1, "Faculty/Staff/Post-Doc"),
        (2, "Grad-Student"),
        (3, "Junior/Senior"),
        (4, "Freshman/Sophomore"),
        (GUIDANCE_CATEGORY, "Guidance"),
        (CONSENSUS_CATEGORY, "Consensus"),
    ];

    LABELS
        .iter()
        .find(|(cat, _)| *cat == category)
        .map(|(_, label)| *label)
        .unwrap_or("Unknown")
}

/// Verification error points, either for a single day or accumulated through a day.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ErrorBreakdown {
    pub max: f64,
    pub min: f64,
    pub wind: f64,
    pub precip: f64,
    pub penalty: f64,
    pub total: f64,
}

/// The identity a record is upserted on.
#[derive(Clone, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct NaturalKey {
    pub name: String,
    pub school: String,
    pub category: u8,
    pub date: NaiveDate,
}

/// One competitor's result for one city on one contest day.
///
/// The identifying fields are fixed at construction so the derived
/// [`CompetitorKind`] can never disagree with them. Forecast values and error
/// points are plain public fields.
#[derive(Clone, PartialEq, Debug)]
pub struct Record {
    school: String,
    year: i32,
    semester: Semester,
    identifier: String,
    day: u8,
    category: u8,
    name: String,
    kind: CompetitorKind,
    date: NaiveDate,

    /// Cumulative count of missed days through this day.
    pub abs: u32,
    pub max: i32,
    pub min: i32,
    pub wind: i32,
    pub precip: f64,
    pub fcst_type: ForecastType,
    pub err: ErrorBreakdown,
    pub cum_err: ErrorBreakdown,
    /// Error relative to the national consensus in tenths of a national standard deviation.
    pub norm_city: f64,
}

impl Record {
    /// Create a record with zeroed forecast values. The season is taken from the date.
    pub fn new(
        name: &str,
        school: &str,
        category: u8,
        identifier: &str,
        date: NaiveDate,
        day: u8,
    ) -> Self {
        Record {
            school: school.to_lowercase(),
            year: date.year(),
            semester: Semester::for_date(date),
            identifier: identifier.to_uppercase(),
            day,
            category,
            name: name.to_owned(),
            kind: CompetitorKind::classify(category, name),
            date,
            abs: 0,
            max: 0,
            min: 0,
            wind: 0,
            precip: 0.0,
            fcst_type: ForecastType::Missed,
            err: ErrorBreakdown::default(),
            cum_err: ErrorBreakdown::default(),
            norm_city: 0.0,
        }
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn semester(&self) -> Semester {
        self.semester
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn category(&self) -> u8 {
        self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CompetitorKind {
        self.kind
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_national(&self) -> bool {
        self.school == NATIONAL_SCHOOL
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            name: self.name.clone(),
            school: self.school.clone(),
            category: self.category,
            date: self.date,
        }
    }
}
