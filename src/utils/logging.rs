use std::{
    fmt::Arguments,
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use jiff::Zoned;
use log::Level;

use crate::error::UpdateError;

/// One line of the log file, `2024-03-01 07:00:00 - INFO - message`.
pub fn log_line(timestamp: &Zoned, level: Level, args: &Arguments) -> String {
    format!(
        "{} - {} - {}",
        timestamp.strftime("%Y-%m-%d %H:%M:%S"),
        level,
        args
    )
}

/// Send all `log` records to the end of `path`.  Only call this once, from
/// `main`.  Library code never installs a logger, so it runs fine in tests
/// without one.
///
/// Level defaults to `info`, `RUST_LOG` overrides it.
pub fn init_file_logger(path: &Path) -> Result<(), UpdateError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| UpdateError::Logging(format!("{}: {}", path.display(), e)))?;

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(buf, "{}", log_line(&Zoned::now(), record.level(), record.args()))
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| UpdateError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line() {
        let ts: Zoned = "2024-03-01T07:00:05-05:00[-05:00]".parse().unwrap();
        let line = log_line(&ts, Level::Warn, &format_args!("Missing section: {}", "a"));
        assert_eq!(line, "2024-03-01 07:00:05 - WARN - Missing section: a");
    }
}
