use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::warn;

/// Operator-facing status of the translation job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Unix seconds of the last time the recurring task was armed.
    pub last_schedule: Option<i64>,
    pub last_error: Option<String>,
    pub translation_count: u64,
}

impl Report {
    pub fn render(&self) -> String {
        let schedule = self
            .last_schedule
            .and_then(format_timestamp)
            .unwrap_or_else(|| "No schedule available".to_string());

        let mut lines = vec![format!("Last Schedule\t{}", schedule)];
        if let Some(error) = self.last_error.as_deref() {
            lines.push(format!("! Last Error\t{}", error));
        }
        lines.push(format!("Number of Translations\t{}", self.translation_count));
        lines.join("\n")
    }
}

fn format_timestamp(unix: i64) -> Option<String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp(unix)
        .ok()
        .and_then(|value| value.format(&format).ok())
}

/// Process-wide diagnostic state shared by the translator, the job and the
/// scheduler. Optionally mirrored to a JSON file after every change.
#[derive(Debug, Default)]
pub struct Diagnostics {
    report: Mutex<Report>,
    path: Option<PathBuf>,
}

impl Diagnostics {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the report at `path` (or starts empty) and persists to it from
    /// then on.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let report = read_report(&path)?;
        Ok(Self {
            report: Mutex::new(report),
            path: Some(path),
        })
    }

    pub fn snapshot(&self) -> Report {
        self.lock().clone()
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let mut report = self.lock();
        report.last_error = Some(message.into());
        self.persist(&report);
    }

    /// Counts one successful translation and clears the last error.
    pub fn record_translation(&self) {
        let mut report = self.lock();
        report.translation_count += 1;
        report.last_error = None;
        self.persist(&report);
    }

    pub fn record_schedule(&self, at: OffsetDateTime) {
        let mut report = self.lock();
        report.last_schedule = Some(at.unix_timestamp());
        self.persist(&report);
    }

    fn lock(&self) -> MutexGuard<'_, Report> {
        self.report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, report: &Report) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if let Err(err) = write_report(path, report) {
            warn!("failed to persist report: {:#}", err);
        }
    }
}

fn read_report(path: &Path) -> Result<Report> {
    if !path.exists() {
        return Ok(Report::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read report: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse report: {}", path.display()))
}

fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report dir: {}", dir.display()))?;
    }
    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content)
        .with_context(|| format!("failed to write report: {}", path.display()))?;
    Ok(())
}
