use crate::parse_season;
use chrono::Local;
use clap::ArgMatches;
use std::{error::Error, fs::File, path::Path};
use wxgrade::{import::read_schedule, parse_date_string, ForecastStore, ScheduleEntry, TablePrinter};

pub fn schedule(root: &Path, sub_args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match sub_args.subcommand() {
        ("import", Some(sub_sub_args)) => schedule_import(root, sub_sub_args),
        ("list", Some(sub_sub_args)) => schedule_list(root, sub_sub_args),
        ("day", Some(sub_sub_args)) => schedule_day(root, sub_sub_args),
        _ => unreachable!(),
    }
}

fn schedule_import(root: &Path, args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = args.value_of("file").unwrap_or_default();
    let parsed = read_schedule(File::open(path)?)?;

    let store = ForecastStore::open_or_create(root)?;
    let num = store.add_schedule(&parsed.items)?;

    println!("{}: {} entries saved, {} skipped.", path, num, parsed.skipped);
    Ok(())
}

fn schedule_list(root: &Path, args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = ForecastStore::open_or_create(root)?;
    let schedule = store.load_schedule()?;

    let entries: Vec<&ScheduleEntry> = match parse_season(args) {
        Some((semester, year)) => schedule.season(semester, year)?,
        None => {
            let mut entries: Vec<_> = schedule.entries().collect();
            entries.sort_by_key(|e| e.start);
            entries
        }
    };

    if entries.is_empty() {
        println!("The schedule is empty.");
        return Ok(());
    }

    let seasons = schedule
        .seasons()
        .map(|(semester, year)| format!("{} {}", semester, year))
        .collect::<Vec<_>>()
        .join(", ");

    let mut tp = TablePrinter::new()
        .with_title("Contest Schedule".to_owned())
        .with_footer(format!("Seasons on file: {}", seasons))
        .with_text_column("City", &[] as &[String])
        .with_text_column("State", &[] as &[String])
        .with_column("Ident", &[] as &[String])
        .with_column("Start", &[] as &[String])
        .with_column("End", &[] as &[String])
        .with_column("Season", &[] as &[String]);

    for entry in entries {
        let (semester, year) = entry.season();
        tp.add_row(vec![
            entry.city.clone(),
            entry.state.clone(),
            entry.ident.clone(),
            entry.start.to_string(),
            entry.end.to_string(),
            format!("{} {}", semester, year),
        ]);
    }

    tp.print()?;
    Ok(())
}

fn schedule_day(root: &Path, args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let date = match args.value_of("date") {
        Some(date) => parse_date_string(date)?,
        None => Local::today().naive_local(),
    };

    let store = ForecastStore::open_or_create(root)?;
    let schedule = store.load_schedule()?;

    match schedule.ident_day(date) {
        Some((entry, day)) => println!(
            "{} is day {} at {} ({}, {}).",
            date, day, entry.ident, entry.city, entry.state
        ),
        None => match schedule.latest(date) {
            Some(end) => println!(
                "{} is not a contest day, the last window ended {}.",
                date, end
            ),
            None => println!("{} is not a contest day.", date),
        },
    }

    Ok(())
}
