//! Error type shared by the library modules.
use crate::record::Semester;

#[derive(Debug, thiserror::Error)]
pub enum WxErr {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse date: {0}")]
    Date(#[from] chrono::ParseError),

    /// The schedule has no cities for the season; it must be re-imported first.
    #[error("no schedule found for {semester} {year}")]
    ScheduleNotFound { semester: Semester, year: i32 },

    #[error("invalid forecast record: {0}")]
    InvalidRecord(String),

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
