use crate::parse_season;
use clap::ArgMatches;
use std::{error::Error, path::Path};
use wxgrade::{bail, calc_trends, most_improved, Filter, ForecastStore, Roster, TablePrinter};

pub fn improved(root: &Path, args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (semester, year) = match parse_season(args) {
        Some(season) => season,
        None => bail("Both --semester and --year are required."),
    };

    let roster = Roster::from_path(Path::new(args.value_of("roster").unwrap_or_default()))?;

    let store = ForecastStore::open_or_create(root)?;
    let forecasts = store.query_forecasts(&Filter::new().semester(semester).year(year), false)?;

    let trends = calc_trends(&forecasts, &roster, semester, year);
    if trends.is_empty() {
        println!("No rostered forecasters with enough forecasts in {} {}.", semester, year);
        return Ok(());
    }

    let mut tp = TablePrinter::new()
        .with_title(format!("Error Trends {} {}", semester, year))
        .with_header(
            "Least squares fit of each day's error against the order it was forecast.".to_owned(),
        )
        .with_text_column("Forecaster", &[] as &[String])
        .with_column("Days", &[] as &[String])
        .with_column("Slope", &[] as &[String])
        .with_column("r", &[] as &[String]);

    for trend in &trends {
        tp.add_row(vec![
            trend.forecaster_id.clone(),
            trend.days.to_string(),
            format!("{:.3}", trend.fit.slope),
            format!("{:.3}", trend.fit.r),
        ]);
    }

    let footer = match most_improved(&trends) {
        Some(best) => format!("Most improved: {}", best.forecaster_id),
        None => "Nobody's error went down this season.".to_owned(),
    };
    tp.with_footer(footer).print()?;

    Ok(())
}
