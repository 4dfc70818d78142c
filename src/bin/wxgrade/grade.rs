use crate::parse_season;
use clap::ArgMatches;
use itertools::Itertools;
use std::{
    error::Error,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};
use wxgrade::{
    bail, category_label, logging, parse_vacation, ClassReport, Filter, ForecastStore, GradePolicy,
    GradeRow, GradingEngine, Report, Roster, TablePrinter, CITY_HEADER, FINAL_HEADER,
};

pub fn grade(root: &Path, args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (semester, year) = match parse_season(args) {
        Some(season) => season,
        None => bail("Both --semester and --year are required."),
    };

    let vacations = args
        .values_of("vacation")
        .map(|vals| vals.map(parse_vacation).collect::<Result<Vec<_>, _>>())
        .unwrap_or_else(|| Ok(vec![]))?;

    let roster = args
        .value_of("roster")
        .map(|path| Roster::from_path(Path::new(path)))
        .transpose()?;

    let print = args.value_of("print") != Some("n");

    let store = ForecastStore::open_or_create(root)?;
    let schedule = store.load_schedule()?;
    let entries = schedule.season(semester, year)?;

    let mut filter = Filter::new().semester(semester).year(year);
    if let Some(school) = args.value_of("school") {
        filter = filter.school(school);
    }

    let (forecasts, national) = store.query_forecasts(&filter, false)?.partition_national();
    if !national.is_empty() {
        debug!(rows = national.len(), "ignoring national rows in the school query");
    }

    let model = store.query_forecasts(&Filter::new().semester(semester).year(year), true)?;

    let dates: Vec<_> = entries.iter().flat_map(|e| e.contest_dates()).collect();
    let verification = store.verifications(&dates)?;

    info!(
        forecasts = forecasts.len(),
        models = model.len(),
        verifications = verification.len(),
        "grading {} {}",
        semester,
        year
    );

    let mut engine = GradingEngine::new(GradePolicy::default())
        .with_verification(&verification)
        .with_vacations(&vacations);
    if model.is_empty() {
        warn!("no national model rows for {} {}, climatology skipped", semester, year);
    } else {
        engine = engine.with_model(&model);
    }

    let sheet = engine.calc_grades(&forecasts);
    logging::log_notes(&sheet.notes);

    if sheet.is_empty() {
        warn!("nothing graded for {} {}", semester, year);
        return Ok(());
    }

    if print {
        print_grade_rows(&sheet.rows)?;
    }

    if let Some(roster) = roster {
        let report = Report::build(&sheet.rows, &roster);

        if print {
            for class in &report.classes {
                print_class(class)?;
            }
        }

        if let Some(save_dir) = args.value_of("save-dir") {
            let written = report.write_csv(&PathBuf::from(save_dir))?;
            println!("Wrote {} files under {}.", written.len(), save_dir);
        }
    }

    Ok(())
}

fn print_grade_rows(rows: &[GradeRow]) -> Result<(), Box<dyn Error>> {
    const HEADER: [&str; 9] = [
        "Name", "Category", "Fcsts", "Absence", "Vacation", "Climo", "School", "National", "Score",
    ];

    let by_station = rows.iter().group_by(|row| row.station.clone());
    for (station, rows) in &by_station {
        let mut tp = empty_table(station.to_string(), &HEADER, 2);
        for row in rows {
            tp.add_row(vec![
                row.name.clone(),
                category_label(row.category).to_owned(),
                row.forecasts.to_string(),
                format!("{:.2}", row.absence_penalty),
                row.vacation_exempt.to_string(),
                format!("{:.2}", row.climo_penalty),
                format!("{:.2}", row.school_bonus),
                format!("{:.2}", row.national_bonus),
                format!("{:.2}", row.score),
            ]);
        }
        tp.print()?;
    }

    Ok(())
}

fn print_class(class: &ClassReport) -> Result<(), Box<dyn Error>> {
    for city in &class.cities {
        let title = format!("{} - {}", class.class, city.identifier);
        let mut tp = empty_table(title, &CITY_HEADER, 2);
        for row in &city.rows {
            tp.add_row(row.as_strings());
        }
        tp.print()?;
    }

    let mut tp = empty_table(format!("{} - Final Grades", class.class), &FINAL_HEADER, 2);
    for row in &class.final_grades {
        tp.add_row(row.as_strings());
    }
    tp.print()?;

    Ok(())
}

/// A table with the given column names, the first `text_cols` of them left aligned.
fn empty_table(title: String, header: &[&str], text_cols: usize) -> TablePrinter {
    header
        .iter()
        .enumerate()
        .fold(TablePrinter::new().with_title(title), |tp, (i, name)| {
            if i < text_cols {
                tp.with_text_column(name, &[] as &[String])
            } else {
                tp.with_column(name, &[] as &[String])
            }
        })
}
