use clap::ArgMatches;
use std::{error::Error, fs::File, path::Path};
use wxgrade::{import::read_verifications, ForecastStore};

pub fn verify(root: &Path, sub_args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match sub_args.subcommand() {
        ("import", Some(sub_sub_args)) => verify_import(root, sub_sub_args),
        _ => unreachable!(),
    }
}

fn verify_import(root: &Path, args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = args.value_of("file").unwrap_or_default();
    let parsed = read_verifications(File::open(path)?)?;

    let store = ForecastStore::open_or_create(root)?;
    let num = store.add_verifications(&parsed.items)?;

    println!("{}: {} days saved, {} skipped.", path, num, parsed.skipped);
    Ok(())
}
