use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

const LOG_FILE: &str = "letitsd.log";

/// Route `log` output to `<state dir>/letitsd.log`; the terminal belongs
/// to the TUI. Filter defaults to `letitsd=info`, overridable with `RUST_LOG`.
///
/// Returns the log file path, or `None` (logging stays off) when no state
/// directory is usable.
pub fn init_logging(state_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = state_dir?;
    fs::create_dir_all(dir).ok()?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("letitsd=info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .ok()?;

    Some(path)
}
