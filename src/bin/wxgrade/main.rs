//! WxChallenge grading tool.
//!
//! Imports contest results into a local database and turns a season of them into grades.
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use dirs::home_dir;
use std::{error::Error, path::PathBuf};
use wxgrade::{bail, logging, Semester};

mod grade;
mod import;
mod improved;
mod schedule;
mod verify;

fn main() {
    if let Err(e) = run() {
        println!("error: {}", e);

        let mut err = &*e;

        while let Some(cause) = err.source() {
            println!("caused by: {}", cause);
            err = cause;
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = parse_args();

    logging::init(matches.occurrences_of("verbose"));

    let root = match matches
        .value_of("root")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|hd| hd.join("wxchallenge")))
    {
        Some(root) => root,
        None => bail("Unable to find a home directory, use --root."),
    };

    match matches.subcommand() {
        ("import", Some(sub_args)) => import::import(&root, sub_args)?,
        ("schedule", Some(sub_args)) => schedule::schedule(&root, sub_args)?,
        ("verify", Some(sub_args)) => verify::verify(&root, sub_args)?,
        ("grade", Some(sub_args)) => grade::grade(&root, sub_args)?,
        ("improved", Some(sub_args)) => improved::improved(&root, sub_args)?,
        _ => unreachable!(),
    }

    Ok(())
}

/// The semester and year options shared by several sub-commands.
fn season_args<'a, 'b>(required: bool) -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("semester")
            .long("semester")
            .short("s")
            .takes_value(true)
            .possible_values(&["fall", "spring", "Fall", "Spring"])
            .required(required)
            .help("The contest semester."),
        Arg::with_name("year")
            .long("year")
            .short("y")
            .takes_value(true)
            .required(required)
            .help("The contest year, e.g. 2019.")
            .long_help(concat!(
                "The year the semester falls in. A fall season that ends in December ",
                "belongs to that year."
            )),
    ]
}

/// Read the semester and year options, if both were given.
fn parse_season(args: &ArgMatches) -> Option<(Semester, i32)> {
    let semester = args.value_of("semester")?;
    let year = args.value_of("year")?;

    let semester: Semester = match semester.parse() {
        Ok(semester) => semester,
        Err(_) => bail(&format!("Invalid semester: {}", semester)),
    };
    let year: i32 = match year.parse() {
        Ok(year) => year,
        Err(_) => bail(&format!("Invalid year: {}", year)),
    };

    Some((semester, year))
}

fn parse_args() -> ArgMatches<'static> {
    App::new("wxgrade")
        .author("WxChallenge grading")
        .version(crate_version!())
        .about("Grade a season of the WxChallenge forecasting contest.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("root")
                .short("r")
                .long("root")
                .takes_value(true)
                .help("Set the data directory.")
                .long_help(concat!(
                    "Set the directory holding the results database. Defaults to ",
                    "${HOME}/wxchallenge, and is created if it does not exist."
                ))
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Log more detail, repeat for even more.")
                .long_help(concat!(
                    "Log more detail to stderr. Once for info, twice for debug and three times ",
                    "for trace. The RUST_LOG environment variable overrides this."
                ))
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("import")
                .about("Import forecast results files.")
                .arg(
                    Arg::with_name("files")
                        .index(1)
                        .multiple(true)
                        .required(true)
                        .takes_value(true)
                        .help("CSV files of contest results."),
                )
                .arg(
                    Arg::with_name("threads")
                        .long("threads")
                        .short("t")
                        .takes_value(true)
                        .default_value("4")
                        .help("Number of files to parse at once."),
                ),
        )
        .subcommand(
            SubCommand::with_name("schedule")
                .about("View and load the contest schedule.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("import")
                        .about("Load schedule entries from a CSV file.")
                        .arg(
                            Arg::with_name("file")
                                .index(1)
                                .required(true)
                                .takes_value(true)
                                .help("CSV with columns city, state, ident, start and end."),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("list")
                        .about("List the cities in the schedule.")
                        .args(&season_args(false)),
                )
                .subcommand(
                    SubCommand::with_name("day")
                        .about("Show the city and contest day for a date.")
                        .arg(
                            Arg::with_name("date")
                                .index(1)
                                .takes_value(true)
                                .help("The date as YYYY-MM-DD, defaults to today."),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Load observed weather.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("import")
                        .about("Load verification rows from a CSV file.")
                        .arg(
                            Arg::with_name("file")
                                .index(1)
                                .required(true)
                                .takes_value(true)
                                .help(concat!(
                                    "CSV with columns city, state, ident, date, max, min, ",
                                    "wind and precip."
                                )),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("grade")
                .about("Grade one season.")
                .args(&season_args(true))
                .arg(
                    Arg::with_name("school")
                        .long("school")
                        .takes_value(true)
                        .help("Only grade this school."),
                )
                .arg(
                    Arg::with_name("roster")
                        .long("roster")
                        .takes_value(true)
                        .help("Roster CSV used to group the grades by class."),
                )
                .arg(
                    Arg::with_name("vacation")
                        .long("vacation")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Excused dates as START:END, may be repeated.")
                        .long_help(concat!(
                            "A range of dates, YYYY-MM-DD:YYYY-MM-DD, where missed forecasts are ",
                            "not penalized. Give the option once per range."
                        )),
                )
                .arg(
                    Arg::with_name("save-dir")
                        .long("save-dir")
                        .takes_value(true)
                        .requires("roster")
                        .help("Write CSV reports under this directory."),
                )
                .arg(
                    Arg::with_name("print")
                        .long("print")
                        .takes_value(true)
                        .possible_values(&["y", "n"])
                        .default_value("y")
                        .help("Print the grade tables."),
                ),
        )
        .subcommand(
            SubCommand::with_name("improved")
                .about("Find the most improved forecaster in a season.")
                .args(&season_args(true))
                .arg(
                    Arg::with_name("roster")
                        .long("roster")
                        .takes_value(true)
                        .required(true)
                        .help("Roster CSV naming the forecasters to consider."),
                ),
        )
        .get_matches()
}
