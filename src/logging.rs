// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Logging
//!
//! `tracing` subscriber with three sinks:
//!
//! | Sink | Content |
//! |------|---------|
//! | console | everything passing the filter (`LOG_FORMAT=json` for JSON lines) |
//! | `<dir>/<YYYY-MM-DD>.info.log` | everything passing the filter except ERROR |
//! | `<dir>/<YYYY-MM-DD>.error.log` | ERROR events only |
//!
//! The filter comes from `RUST_LOG`, falling back to the configured level.
//! Files switch to a new name on the first write after local midnight.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::MakeWriterExt, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Append-only log file named after the current calendar day.
pub struct DailyFile {
    dir: PathBuf,
    suffix: &'static str,
    current: Mutex<Option<(NaiveDate, File)>>,
}

impl DailyFile {
    pub fn new(dir: impl Into<PathBuf>, suffix: &'static str) -> Self {
        Self {
            dir: dir.into(),
            suffix,
            current: Mutex::new(None),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{}.log", date.format("%Y-%m-%d"), self.suffix))
    }

    /// Write `buf` to the file for `date`, reopening if the day changed.
    pub fn write_dated(&self, buf: &[u8], date: NaiveDate) -> io::Result<usize> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;

        let stale = !matches!(current.as_ref(), Some((open_date, _)) if *open_date == date);
        if stale {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(date))?;
            *current = Some((date, file));
        }

        match current.as_mut() {
            Some((_, file)) => {
                file.write_all(buf)?;
                Ok(buf.len())
            }
            None => Err(io::Error::other("log file not open")),
        }
    }

    fn flush(&self) -> io::Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;
        match current.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

pub struct DailyFileWriter<'a> {
    sink: &'a DailyFile,
}

impl Write for DailyFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write_dated(buf, Local::now().date_naive())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<'a> MakeWriter<'a> for DailyFile {
    type Writer = DailyFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        DailyFileWriter { sink: self }
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},tower_http=warn")))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: &str, dir: &Path) -> Result<(), LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let info_file = fmt::layer()
        .with_ansi(false)
        .with_writer(DailyFile::new(dir, "info").with_min_level(Level::WARN));
    let error_file = fmt::layer()
        .with_ansi(false)
        .with_writer(DailyFile::new(dir, "error").with_max_level(Level::ERROR));

    tracing_subscriber::registry()
        .with(default_filter(level))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .with(info_file)
        .with(error_file)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn file_name_carries_date_and_suffix() {
        let sink = DailyFile::new("/var/log/gate", "error");
        assert_eq!(
            sink.path_for(day(7)),
            PathBuf::from("/var/log/gate/2026-03-07.error.log")
        );
    }

    #[test]
    fn rotates_on_day_change_and_appends_within_a_day() {
        let dir = TempDir::new().unwrap();
        let sink = DailyFile::new(dir.path(), "info");

        sink.write_dated(b"first\n", day(1)).unwrap();
        sink.write_dated(b"second\n", day(1)).unwrap();
        sink.write_dated(b"third\n", day(2)).unwrap();

        let first = fs::read_to_string(sink.path_for(day(1))).unwrap();
        let second = fs::read_to_string(sink.path_for(day(2))).unwrap();
        assert_eq!(first, "first\nsecond\n");
        assert_eq!(second, "third\n");
    }

    #[test]
    fn reopening_a_day_appends() {
        let dir = TempDir::new().unwrap();
        DailyFile::new(dir.path(), "info")
            .write_dated(b"before restart\n", day(5))
            .unwrap();

        let sink = DailyFile::new(dir.path(), "info");
        sink.write_dated(b"after restart\n", day(5)).unwrap();

        let content = fs::read_to_string(sink.path_for(day(5))).unwrap();
        assert_eq!(content, "before restart\nafter restart\n");
    }

    fn read_all_with_suffix(dir: &Path, suffix: &str) -> String {
        let mut out = String::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.to_string_lossy().ends_with(suffix) {
                out.push_str(&fs::read_to_string(path).unwrap());
            }
        }
        out
    }

    #[test]
    fn info_and_error_files_are_disjoint() {
        let dir = TempDir::new().unwrap();

        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("info"))
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(DailyFile::new(dir.path(), "info").with_min_level(Level::WARN)),
            )
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(DailyFile::new(dir.path(), "error").with_max_level(Level::ERROR)),
            );

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("filtered out");
            tracing::info!(status = 200, "request completed");
            tracing::warn!("store slow");
            tracing::error!(status = 401, "request failed");
        });

        let info = read_all_with_suffix(dir.path(), ".info.log");
        let error = read_all_with_suffix(dir.path(), ".error.log");

        assert!(info.contains("request completed"));
        assert!(info.contains("store slow"));
        assert!(!info.contains("request failed"));
        assert!(!info.contains("filtered out"));

        assert!(error.contains("request failed"));
        assert!(!error.contains("request completed"));
        assert!(!error.contains("store slow"));
    }
}
