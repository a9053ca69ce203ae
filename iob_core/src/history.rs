//! Dose history storage.
//!
//! The engine only ever sees slices of [`InsulinDose`]; where they come
//! from is behind [`DoseSource`] / [`DoseSink`]. [`JsonlDoseLog`] is the
//! file-backed implementation: one JSON dose per line, guarded by file
//! locks so concurrent writers do not interleave.

use crate::{CalculatorSettings, Error, InsulinDose, InsulinType, Result};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Conventional lookback for rapid/short-acting history
pub const DEFAULT_LOOKBACK_HOURS: i64 = 6;

/// Supplies dose records for IOB evaluation
pub trait DoseSource {
    /// Every recorded dose, in storage order
    fn load_all(&self) -> Result<Vec<InsulinDose>>;

    /// Doses taken at or after `cutoff`, oldest first
    fn load_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<InsulinDose>> {
        let mut doses: Vec<_> = self
            .load_all()?
            .into_iter()
            .filter(|d| d.timestamp >= cutoff)
            .collect();

        // Back-dated entries may be appended out of order
        doses.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        tracing::info!("Loaded {} doses since {}", doses.len(), cutoff);
        Ok(doses)
    }
}

/// Records newly administered doses
pub trait DoseSink {
    fn append(&mut self, dose: &InsulinDose) -> Result<()>;
}

/// The longest configured action duration, rounded up to whole hours,
/// and never less than [`DEFAULT_LOOKBACK_HOURS`]
pub fn lookback_window(settings: &CalculatorSettings) -> Result<Duration> {
    let longest = [
        InsulinType::Rapid,
        InsulinType::Short,
        InsulinType::Intermediate,
        InsulinType::Long,
    ]
    .into_iter()
    .map(|t| settings.duration_for(t))
    .fold(0.0_f64, f64::max);

    if !longest.is_finite() {
        return Err(Error::Config(format!(
            "Action duration must be a finite number of hours, got {}",
            longest
        )));
    }

    // `as` saturates, try_hours catches what is still out of range
    let hours = (longest.ceil() as i64).max(DEFAULT_LOOKBACK_HOURS);
    Duration::try_hours(hours)
        .ok_or_else(|| Error::Config(format!("Action duration of {} hours is out of range", longest)))
}

/// Doses that can still contribute to IOB at `now`, oldest first
///
/// A dose is kept when it falls inside [`lookback_window`] or when its own
/// recorded duration has not yet elapsed, so per-dose duration overrides
/// longer than any configured default are not dropped.
pub fn load_active_doses(
    source: &impl DoseSource,
    settings: &CalculatorSettings,
    now: DateTime<Utc>,
) -> Result<Vec<InsulinDose>> {
    let cutoff = now - lookback_window(settings)?;

    let mut doses: Vec<_> = source
        .load_all()?
        .into_iter()
        .filter(|d| d.timestamp >= cutoff || still_acting(d, now))
        .collect();
    doses.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    tracing::info!("Loaded {} doses still relevant at {}", doses.len(), now);
    Ok(doses)
}

fn still_acting(dose: &InsulinDose, now: DateTime<Utc>) -> bool {
    let hours_elapsed = (now - dose.timestamp).num_milliseconds() as f64 / 3_600_000.0;
    hours_elapsed < dose.duration
}

/// JSONL-backed dose log with file locking
pub struct JsonlDoseLog {
    path: PathBuf,
}

impl JsonlDoseLog {
    /// Create a dose log at the given path (the file is created on first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Read every parseable dose in file order
    ///
    /// Corrupt lines are logged and skipped rather than failing the read.
    pub fn read_all(&self) -> Result<Vec<InsulinDose>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut doses = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<InsulinDose>(&line) {
                Ok(dose) => doses.push(dose),
                Err(e) => {
                    tracing::warn!("Skipping unreadable dose at line {}: {}", line_num + 1, e);
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} doses from {:?}", doses.len(), self.path);
        Ok(doses)
    }
}

impl DoseSource for JsonlDoseLog {
    fn load_all(&self) -> Result<Vec<InsulinDose>> {
        self.read_all()
    }
}

impl DoseSink for JsonlDoseLog {
    fn append(&mut self, dose: &InsulinDose) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(dose)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended dose {} ({}u {}) to log", dose.id, dose.amount, dose.insulin_type);
        Ok(())
    }
}
