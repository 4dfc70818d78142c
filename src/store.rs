//! SQLite backed storage for forecasts, schedules and verifications.
use crate::{
    error::WxErr,
    record::{ErrorBreakdown, ForecastType, Record, NATIONAL_SCHOOL},
    schedule::{Schedule, ScheduleEntry},
    table::{Filter, ForecastTable, Upsert, UpsertCounts},
    verification::{Verification, VerificationTable},
};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, types::ToSql, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use strum::AsStaticRef;

/// File name of the database inside the data root.
pub const DB_FILE: &str = "wxchallenge.db";

const FORECAST_COLUMNS: &str = "name, school, category, date, identifier, day, semester, year,
    abs, max, min, wind, precip, type,
    err_max, err_min, err_wind, err_precip, err_penalty, err_total,
    cum_err_max, cum_err_min, cum_err_wind, cum_err_precip, cum_err_penalty, cum_err_total,
    norm_city";

pub struct ForecastStore {
    db_conn: Connection,
    path: PathBuf,
}

impl ForecastStore {
    /// Open the database under `root`, creating the directory, file and tables as needed.
    pub fn open_or_create(root: &Path) -> Result<Self, WxErr> {
        std::fs::create_dir_all(root)?;
        let db_file = root.join(DB_FILE);

        let db_conn = Connection::open_with_flags(
            &db_file,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        db_conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS forecasts (
                name            TEXT NOT NULL,
                school          TEXT NOT NULL,
                category        INTEGER NOT NULL,
                date            TEXT NOT NULL,
                identifier      TEXT NOT NULL,
                day             INTEGER NOT NULL,
                semester        TEXT NOT NULL,
                year            INTEGER NOT NULL,
                abs             INTEGER NOT NULL,
                max             INTEGER NOT NULL,
                min             INTEGER NOT NULL,
                wind            INTEGER NOT NULL,
                precip          REAL NOT NULL,
                type            TEXT NOT NULL,
                err_max         REAL NOT NULL,
                err_min         REAL NOT NULL,
                err_wind        REAL NOT NULL,
                err_precip      REAL NOT NULL,
                err_penalty     REAL NOT NULL,
                err_total       REAL NOT NULL,
                cum_err_max     REAL NOT NULL,
                cum_err_min     REAL NOT NULL,
                cum_err_wind    REAL NOT NULL,
                cum_err_precip  REAL NOT NULL,
                cum_err_penalty REAL NOT NULL,
                cum_err_total   REAL NOT NULL,
                norm_city       REAL NOT NULL,
                UNIQUE(name, school, category, date)
            );

            CREATE TABLE IF NOT EXISTS schedule (
                city  TEXT NOT NULL,
                state TEXT NOT NULL,
                ident TEXT NOT NULL,
                start TEXT NOT NULL,
                \"end\" TEXT NOT NULL,
                UNIQUE(ident, start)
            );

            CREATE TABLE IF NOT EXISTS verifications (
                city   TEXT NOT NULL,
                state  TEXT NOT NULL,
                ident  TEXT NOT NULL,
                date   TEXT NOT NULL,
                max    INTEGER NOT NULL,
                min    INTEGER NOT NULL,
                wind   INTEGER NOT NULL,
                precip REAL NOT NULL,
                UNIQUE(ident, date)
            );",
        )?;

        Ok(ForecastStore {
            db_conn,
            path: db_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    //
    // Forecasts
    //

    /// Insert new records and update stored ones whose values changed, all in one transaction.
    pub fn upsert_forecasts<'a, I>(&mut self, records: I) -> Result<UpsertCounts, WxErr>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut counts = UpsertCounts::default();

        let tx = self.db_conn.transaction()?;
        {
            let mut select = tx.prepare(&format!(
                "SELECT {} FROM forecasts
                 WHERE name = ?1 AND school = ?2 AND category = ?3 AND date = ?4",
                FORECAST_COLUMNS
            ))?;
            let mut insert = tx.prepare(&format!(
                "INSERT INTO forecasts ({}) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                    ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
                FORECAST_COLUMNS
            ))?;
            let mut update = tx.prepare(
                "UPDATE forecasts SET
                    identifier = ?5, day = ?6, semester = ?7, year = ?8, abs = ?9, max = ?10,
                    min = ?11, wind = ?12, precip = ?13, type = ?14, err_max = ?15,
                    err_min = ?16, err_wind = ?17, err_precip = ?18, err_penalty = ?19,
                    err_total = ?20, cum_err_max = ?21, cum_err_min = ?22, cum_err_wind = ?23,
                    cum_err_precip = ?24, cum_err_penalty = ?25, cum_err_total = ?26,
                    norm_city = ?27
                 WHERE name = ?1 AND school = ?2 AND category = ?3 AND date = ?4",
            )?;

            for rec in records {
                let mut existing = select.query_map(
                    params![rec.name(), rec.school(), rec.category(), rec.date()],
                    record_from_row,
                )?;

                let outcome = match existing.next().transpose()? {
                    Some(ref stored) if stored == rec => Upsert::Unchanged,
                    Some(_) => {
                        let vals = record_params(rec);
                        update.execute(params_from_iter(vals.iter().map(|v| v.as_ref())))?;
                        Upsert::Updated
                    }
                    None => {
                        let vals = record_params(rec);
                        insert.execute(params_from_iter(vals.iter().map(|v| v.as_ref())))?;
                        Upsert::Inserted
                    }
                };
                counts.add(outcome);
            }
        }
        tx.commit()?;

        Ok(counts)
    }

    /// Load the records matching `filter`.
    ///
    /// With `models` set only the national rows (school `xxx`) are returned and the school and
    /// category filters are ignored.
    pub fn query_forecasts(&self, filter: &Filter, models: bool) -> Result<ForecastTable, WxErr> {
        let mut clauses: Vec<String> = vec![];
        let mut values: Vec<Box<dyn ToSql>> = vec![];

        let mut any_of = |column: &str, vals: Vec<Box<dyn ToSql>>| {
            if vals.is_empty() {
                return;
            }
            let marks = vec!["?"; vals.len()].join(", ");
            clauses.push(format!("{} IN ({})", column, marks));
            values.extend(vals);
        };

        fn boxed<T: ToSql + Clone + 'static>(vals: &[T]) -> Vec<Box<dyn ToSql>> {
            vals.iter()
                .map(|v| Box::new(v.clone()) as Box<dyn ToSql>)
                .collect()
        }

        any_of("name", boxed(&filter.names));
        if models {
            any_of("school", boxed(&[NATIONAL_SCHOOL.to_owned()]));
        } else {
            any_of("school", boxed(&filter.schools));
            any_of("category", boxed(&filter.categories));
        }
        let semesters: Vec<String> = filter
            .semesters
            .iter()
            .map(|s| s.as_static().to_owned())
            .collect();
        any_of("semester", boxed(&semesters));
        any_of("year", boxed(&filter.years));

        let mut sql = format!("SELECT {} FROM forecasts", FORECAST_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date, school, category, name");

        let mut stmt = self.db_conn.prepare(&sql)?;
        let table = stmt
            .query_map(
                params_from_iter(values.iter().map(|v| v.as_ref())),
                record_from_row,
            )?
            .collect::<Result<ForecastTable, _>>()?;

        Ok(table)
    }

    pub fn count_forecasts(&self) -> Result<usize, WxErr> {
        let count: i64 = self
            .db_conn
            .query_row("SELECT COUNT(*) FROM forecasts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    //
    // Schedule
    //

    pub fn add_schedule(&self, entries: &[ScheduleEntry]) -> Result<usize, WxErr> {
        let mut stmt = self.db_conn.prepare(
            "INSERT OR REPLACE INTO schedule (city, state, ident, start, \"end\")
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        let mut num = 0;
        for entry in entries {
            num += stmt.execute(params![
                entry.city,
                entry.state,
                entry.ident,
                entry.start,
                entry.end
            ])?;
        }

        Ok(num)
    }

    pub fn load_schedule(&self) -> Result<Schedule, WxErr> {
        let mut stmt = self
            .db_conn
            .prepare("SELECT city, state, ident, start, \"end\" FROM schedule")?;

        let schedule = stmt
            .query_map([], |row| {
                Ok(ScheduleEntry {
                    city: row.get(0)?,
                    state: row.get(1)?,
                    ident: row.get(2)?,
                    start: row.get(3)?,
                    end: row.get(4)?,
                })
            })?
            .collect::<Result<Schedule, _>>()?;

        Ok(schedule)
    }

    //
    // Verification
    //

    pub fn add_verifications(&self, verifs: &[Verification]) -> Result<usize, WxErr> {
        let mut stmt = self.db_conn.prepare(
            "INSERT OR REPLACE INTO verifications
                (city, state, ident, date, max, min, wind, precip)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        let mut num = 0;
        for v in verifs {
            num += stmt.execute(params![
                v.city, v.state, v.ident, v.date, v.max, v.min, v.wind, v.precip
            ])?;
        }

        Ok(num)
    }

    /// Verifications for the given dates. Dates without one are simply absent.
    pub fn verifications(&self, dates: &[NaiveDate]) -> Result<VerificationTable, WxErr> {
        if dates.is_empty() {
            return Ok(VerificationTable::new());
        }

        let marks = vec!["?"; dates.len()].join(", ");
        let mut stmt = self.db_conn.prepare(&format!(
            "SELECT city, state, ident, date, max, min, wind, precip
             FROM verifications WHERE date IN ({})",
            marks
        ))?;

        let table = stmt
            .query_map(params_from_iter(dates.iter()), |row| {
                Ok(Verification {
                    city: row.get(0)?,
                    state: row.get(1)?,
                    ident: row.get(2)?,
                    date: row.get(3)?,
                    max: row.get(4)?,
                    min: row.get(5)?,
                    wind: row.get(6)?,
                    precip: row.get(7)?,
                })
            })?
            .collect::<Result<VerificationTable, _>>()?;

        Ok(table)
    }
}

/// Values in `FORECAST_COLUMNS` order.
fn record_params(rec: &Record) -> Vec<Box<dyn ToSql + '_>> {
    let err = &rec.err;
    let cum = &rec.cum_err;

    vec![
        Box::new(rec.name()),
        Box::new(rec.school()),
        Box::new(rec.category()),
        Box::new(rec.date()),
        Box::new(rec.identifier()),
        Box::new(rec.day()),
        Box::new(rec.semester().as_static()),
        Box::new(rec.year()),
        Box::new(rec.abs),
        Box::new(rec.max),
        Box::new(rec.min),
        Box::new(rec.wind),
        Box::new(rec.precip),
        Box::new(rec.fcst_type.code()),
        Box::new(err.max),
        Box::new(err.min),
        Box::new(err.wind),
        Box::new(err.precip),
        Box::new(err.penalty),
        Box::new(err.total),
        Box::new(cum.max),
        Box::new(cum.min),
        Box::new(cum.wind),
        Box::new(cum.precip),
        Box::new(cum.penalty),
        Box::new(cum.total),
        Box::new(rec.norm_city),
    ]
}

fn record_from_row(row: &Row) -> rusqlite::Result<Record> {
    let breakdown = |start: usize| -> rusqlite::Result<ErrorBreakdown> {
        Ok(ErrorBreakdown {
            max: row.get(start)?,
            min: row.get(start + 1)?,
            wind: row.get(start + 2)?,
            precip: row.get(start + 3)?,
            penalty: row.get(start + 4)?,
            total: row.get(start + 5)?,
        })
    };

    let name: String = row.get(0)?;
    let school: String = row.get(1)?;
    let identifier: String = row.get(4)?;
    let fcst_type: String = row.get(13)?;

    let mut rec = Record::new(&name, &school, row.get(2)?, &identifier, row.get(3)?, row.get(5)?);
    rec.abs = row.get(8)?;
    rec.max = row.get(9)?;
    rec.min = row.get(10)?;
    rec.wind = row.get(11)?;
    rec.precip = row.get(12)?;
    rec.fcst_type = ForecastType::from_code(&fcst_type);
    rec.err = breakdown(14)?;
    rec.cum_err = breakdown(20)?;
    rec.norm_city = row.get(26)?;

    Ok(rec)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::Semester;

    fn sample(name: &str, school: &str, category: u8, day: u8) -> Record {
        let date = NaiveDate::from_ymd(2019, 9, 8 + u32::from(day));
        let mut rec = Record::new(name, school, category, "KPDX", date, day);
        rec.max = 70 + i32::from(day);
        rec.precip = 0.05;
        rec.fcst_type = ForecastType::Human;
        rec.err.total = 4.5;
        rec.cum_err.total = 4.5 * f64::from(day);
        rec.norm_city = -3.2;
        rec
    }

    #[test]
    fn test_upsert_and_query() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = ForecastStore::open_or_create(tmp.path()).unwrap();

        let recs = vec![
            sample("amy", "tam", 3, 1),
            sample("amy", "tam", 3, 2),
            sample("bob", "osu", 2, 1),
            sample("CLIMO_", "xxx", 8, 1),
        ];

        let counts = store.upsert_forecasts(&recs).unwrap();
        assert_eq!(counts.inserted, 4);

        let counts = store.upsert_forecasts(&recs).unwrap();
        assert_eq!(counts.unchanged, 4);
        assert_eq!(store.count_forecasts().unwrap(), 4);

        let mut changed = recs[0].clone();
        changed.abs = 1;
        let counts = store.upsert_forecasts(vec![&changed]).unwrap();
        assert_eq!(counts.updated, 1);

        let tam = store
            .query_forecasts(&Filter::new().school("tam").year(2019), false)
            .unwrap();
        assert_eq!(tam.len(), 2);
        assert_eq!(tam.get(&changed.natural_key()), Some(&changed));

        let models = store
            .query_forecasts(&Filter::new().semester(Semester::Fall).category(3), true)
            .unwrap();
        assert_eq!(models.len(), 1);

        let none = store
            .query_forecasts(&Filter::new().semester(Semester::Spring), false)
            .unwrap();
        assert!(none.is_empty());
    }
}
