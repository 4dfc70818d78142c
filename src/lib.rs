//! Grading for a weather forecasting contest: store the daily results, then turn a season of
//! them into a grade per student per city and per class.

//
// Public API
//
pub use error::WxErr;
pub use grading::{GradeNote, GradePolicy, GradeRow, GradeSheet, GradingEngine, Station};
pub use record::{
    category_label, CompetitorKind, ErrorBreakdown, ForecastType, NaturalKey, Record, Semester,
    CONSENSUS_CATEGORY, CONSENSUS_NAME, GUIDANCE_CATEGORY, NATIONAL_SCHOOL,
};
pub use report::{
    CitySheet, ClassReport, FinalRow, Report, ReportRow, CITY_HEADER, FINAL_GRADES, FINAL_HEADER,
};
pub use roster::{Roster, RosterEntry, ALL_CLASS, NO_CLASS};
pub use schedule::{Schedule, ScheduleEntry};
pub use store::ForecastStore;
pub use table::{Filter, ForecastTable, KeyField, KeyValue, Order, Upsert, UpsertCounts};
pub use table_printer::{Align, TablePrinter};
pub use trend::{calc_trends, most_improved, LinearFit, Trend};
pub use util::{bail, parse_date_string, parse_vacation, round2};
pub use verification::{Verification, VerificationLookup, VerificationTable};

pub mod grading;
pub mod import;
pub mod logging;

//
// Internal only
//
mod error;
mod record;
mod report;
mod roster;
mod schedule;
mod store;
mod table;
mod table_printer;
mod trend;
mod util;
mod verification;
