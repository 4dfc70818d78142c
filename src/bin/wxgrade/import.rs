use clap::ArgMatches;
use crossbeam_channel as channel;
use std::{
    error::Error,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    thread::spawn,
};
use threadpool::ThreadPool;
use tracing::{debug, info};
use wxgrade::{bail, import::read_forecasts, ForecastStore, Record, UpsertCounts};

const CAPACITY: usize = 16;

/// Where each file is in the import pipeline.
enum StepResult {
    Parsed(PathBuf, Vec<Record>, usize),
    Stored(PathBuf, UpsertCounts, usize),
    ReadError(PathBuf, String),
    StoreError(PathBuf, String),
    InitializationError(String),
}

pub fn import(root: &Path, sub_args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let files: Vec<PathBuf> = sub_args
        .values_of("files")
        .map(|vals| vals.map(PathBuf::from).collect())
        .unwrap_or_default();

    let threads: usize = match sub_args.value_of("threads").unwrap_or("4").parse() {
        Ok(n) if n > 0 => n,
        _ => bail("--threads must be a positive integer."),
    };

    let (parse_tx, save_rx) = channel::bounded::<StepResult>(CAPACITY);
    let (save_tx, print_rx) = channel::bounded::<StepResult>(CAPACITY);

    start_parser_pool(files, threads, parse_tx);
    start_writer_thread(root.to_owned(), save_rx, save_tx);

    let mut total = UpsertCounts::default();
    let mut failures = 0;

    for step_result in print_rx {
        use StepResult::*;

        match step_result {
            Stored(path, counts, skipped) => {
                println!(
                    "{}: {} new, {} updated, {} unchanged, {} skipped.",
                    path.display(),
                    counts.inserted,
                    counts.updated,
                    counts.unchanged,
                    skipped
                );
                total.inserted += counts.inserted;
                total.updated += counts.updated;
                total.unchanged += counts.unchanged;
            }
            ReadError(path, msg) => {
                println!("{}: unable to read: {}", path.display(), msg);
                failures += 1;
            }
            StoreError(path, msg) => {
                println!("{}: unable to store: {}", path.display(), msg);
                failures += 1;
            }
            InitializationError(msg) => {
                println!("Error opening the database: {}", msg);
                failures += 1;
            }
            Parsed(..) => unreachable!(),
        }
    }

    info!(
        inserted = total.inserted,
        updated = total.updated,
        unchanged = total.unchanged,
        failures,
        "import finished"
    );
    println!(
        "Total: {} new, {} updated, {} unchanged, {} files failed.",
        total.inserted, total.updated, total.unchanged, failures
    );

    Ok(())
}

/// Parse every file on a pool of worker threads. The sender is dropped once the last file is
/// done, which closes the channel.
fn start_parser_pool(files: Vec<PathBuf>, threads: usize, parse_tx: channel::Sender<StepResult>) {
    let pool = ThreadPool::new(threads);

    for path in files {
        let parse_tx = parse_tx.clone();
        pool.execute(move || {
            debug!(file = %path.display(), "parsing");

            let next_step = match File::open(&path) {
                Ok(f) => match read_forecasts(BufReader::new(f)) {
                    Ok(parsed) => StepResult::Parsed(path, parsed.items, parsed.skipped),
                    Err(err) => StepResult::ReadError(path, err.to_string()),
                },
                Err(err) => StepResult::ReadError(path, err.to_string()),
            };

            // The receiver only goes away if the writer died, nothing left to do then.
            let _ = parse_tx.send(next_step);
        });
    }
}

fn start_writer_thread(
    root: PathBuf,
    save_rx: channel::Receiver<StepResult>,
    save_tx: channel::Sender<StepResult>,
) {
    spawn(move || {
        let mut store = match ForecastStore::open_or_create(&root) {
            Ok(store) => store,
            Err(err) => {
                let _ = save_tx.send(StepResult::InitializationError(err.to_string()));
                return;
            }
        };

        for step_result in save_rx {
            let next_step = match step_result {
                StepResult::Parsed(path, records, skipped) => {
                    match store.upsert_forecasts(&records) {
                        Ok(counts) => StepResult::Stored(path, counts, skipped),
                        Err(err) => StepResult::StoreError(path, err.to_string()),
                    }
                }
                _ => step_result,
            };

            if save_tx.send(next_step).is_err() {
                return;
            }
        }
    });
}
