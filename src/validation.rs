/// Batch validation of jump detection against generated fixtures.
///
/// Every `*.txt` sample file in a directory is filtered and scanned with the same
/// parameters; a file passes when its jump points match the expected list.
/// Files are independent sessions, so they run in parallel.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::Writer;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::signal_rectifier::SignalRectifier;

pub const EXPECTED_JUMPS: [f64; 3] = [0.75, 1.5, 2.25];
const JUMP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationStatus {
    Passed,
    WrongJumps,
    /// Load or filter failure; the file is counted as failed and the batch goes on.
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ValidationEntry {
    pub path: PathBuf,
    pub detected: Vec<f64>,
    pub status: ValidationStatus,
}

impl ValidationEntry {
    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Passed
    }
}

#[derive(Debug, Serialize)]
struct ValidationRecord {
    file: String,
    status: &'static str,
    detected_jumps: String,
    error: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub started_at: DateTime<Utc>,
    pub expected: Vec<f64>,
    pub entries: Vec<ValidationEntry>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.entries.iter().filter(|e| e.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn write_csv(&self, output_path: &Path) -> Result<()> {
        let mut wtr = Writer::from_path(output_path)?;

        for entry in &self.entries {
            let (status, error) = match &entry.status {
                ValidationStatus::Passed => ("ok", String::new()),
                ValidationStatus::WrongJumps => ("wrong_jumps", String::new()),
                ValidationStatus::Error(msg) => ("error", msg.clone()),
            };
            wtr.serialize(ValidationRecord {
                file: entry.path.display().to_string(),
                status,
                detected_jumps: entry
                    .detected
                    .iter()
                    .map(|j| j.to_string())
                    .collect::<Vec<_>>()
                    .join(";"),
                error,
            })?;
        }

        wtr.flush()?;
        Ok(())
    }
}

pub fn jumps_match(detected: &[f64], expected: &[f64]) -> bool {
    detected.len() == expected.len()
        && detected
            .iter()
            .zip(expected)
            .all(|(d, e)| (d - e).abs() < JUMP_TOLERANCE)
}

/// Sample files directly inside `dir`, sorted by name.
pub fn collect_sample_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("not a directory: {}", dir.display()),
        )
        .into());
    }

    let files = WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|s| s.to_str())
                    .map(|s| s.eq_ignore_ascii_case("txt"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.path().to_path_buf())
        .collect();

    Ok(files)
}

pub fn validate_file(path: &Path, config: &PipelineConfig, expected: &[f64]) -> ValidationEntry {
    let detected = SignalRectifier::from_file(path).and_then(|mut sr| {
        sr.apply_filter(config.noise_filter())?;
        let jumps = sr.detect_jumps_with(config.jump_detector())?.to_vec();
        Ok(jumps)
    });

    match detected {
        Ok(detected) => {
            let status = if jumps_match(&detected, expected) {
                ValidationStatus::Passed
            } else {
                ValidationStatus::WrongJumps
            };
            ValidationEntry {
                path: path.to_path_buf(),
                detected,
                status,
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "validation run failed");
            ValidationEntry {
                path: path.to_path_buf(),
                detected: vec![],
                status: ValidationStatus::Error(e.to_string()),
            }
        }
    }
}

pub fn validate_directory(
    dir: &Path,
    config: &PipelineConfig,
    expected: &[f64],
) -> Result<ValidationReport> {
    config.validate()?;
    let started_at = Utc::now();
    let files = collect_sample_files(dir)?;

    info!(
        files = files.len(),
        cores = num_cpus::get(),
        dir = %dir.display(),
        "validating jump detection"
    );

    let entries: Vec<ValidationEntry> = files
        .par_iter()
        .map(|path| validate_file(path, config, expected))
        .collect();

    Ok(ValidationReport {
        started_at,
        expected: expected.to_vec(),
        entries,
    })
}
