use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the output folder created under the library root. Never treated as an album.
pub const OUTPUT_DIR_NAME: &str = "merged_tracks";

/// One album folder scheduled for merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumJob {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub label: String,
}

/// Outcome classification of a single album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Success,
    Error,
    /// The folder held no recognised audio files
    Skipped,
}

/// Final result reported for one album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub label: String,
    pub status: JobStatus,
}

impl AlbumJob {
    /// Create a job for `source_dir`, writing to `<output_dir>/<folder name>.<extension>`.
    ///
    /// The output path keeps the folder name byte for byte; only `label` is lossy.
    pub fn new(source_dir: PathBuf, output_dir: &Path, extension: &str) -> Self {
        let name = source_dir.file_name().unwrap_or_default();

        let mut file_name = OsString::from(name);
        file_name.push(".");
        file_name.push(extension);

        Self {
            output_path: output_dir.join(file_name),
            label: name.to_string_lossy().into_owned(),
            source_dir,
        }
    }

    /// Folder name as found on disk
    pub fn dir_name(&self) -> &OsStr {
        self.source_dir.file_name().unwrap_or_default()
    }

    pub fn finish(self, status: JobStatus) -> JobResult {
        JobResult {
            label: self.label,
            status,
        }
    }
}

impl JobResult {
    pub fn new(label: impl Into<String>, status: JobStatus) -> Self {
        Self {
            label: label.into(),
            status,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Success => "Success",
            JobStatus::Error => "Error",
            JobStatus::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            JobStatus::Skipped => write!(f, "{}: {} (No audio files)", self.status, self.label),
            _ => write!(f, "{}: {}", self.status, self.label),
        }
    }
}

/// Create one job per direct subdirectory of `parent`, excluding the output folder.
///
/// Does not recurse. Jobs come back sorted by folder name so submission order is stable.
/// Failing to list `parent` is an error, never an empty result.
pub fn discover_jobs(parent: &Path, output_dir: &Path, extension: &str) -> Result<Vec<AlbumJob>> {
    let list_error = || format!("Failed to list music directory {parent:?}");
    let mut jobs = Vec::new();

    for entry in std::fs::read_dir(parent).with_context(list_error)? {
        let path = entry.with_context(list_error)?.path();

        if !path.is_dir() || path.file_name() == Some(OsStr::new(OUTPUT_DIR_NAME)) {
            continue;
        }

        debug!("Discovered album folder: {:?}", path);
        jobs.push(AlbumJob::new(path, output_dir, extension));
    }

    jobs.sort_by(|a, b| a.source_dir.cmp(&b.source_dir));
    Ok(jobs)
}
