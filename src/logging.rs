use crate::grading::GradeNote;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing based on how many times `-v` was given.
///
/// 0 is warn, 1 info, 2 debug and 3 or more trace. `RUST_LOG` overrides the flag if set.
pub fn init(verbosity: u64) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wxgrade={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Send grading notes to the log, warnings at warn level and the rest at info.
pub fn log_notes<'a, I>(notes: I)
where
    I: IntoIterator<Item = &'a GradeNote>,
{
    for note in notes {
        if note.is_warning() {
            warn!("{}", note);
        } else {
            info!("{}", note);
        }
    }
}
