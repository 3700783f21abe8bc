//! Diagnostic logging setup.
//!
//! Library code only emits `tracing` events. The binary installs a subscriber
//! here: filtered by `RUST_LOG` when set, otherwise `warn` (or `info` when
//! verbose), written to stderr or appended to a log file.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened. Installing a subscriber
/// twice is not an error; the second call is ignored.
pub fn init(verbose: bool, log_file: Option<&Path>) -> io::Result<()> {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();

    Ok(())
}
