use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::Config;
use crate::job::{discover_jobs, JobResult, JobStatus, OUTPUT_DIR_NAME};
use crate::scheduler::BatchScheduler;
use crate::worker::AlbumWorker;

/// Outcome of one merge run
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub output_dir: PathBuf,
    /// One entry per album, sorted by label
    pub results: Vec<JobResult>,
    pub elapsed: Duration,
}

impl MergeReport {
    pub fn count(&self, status: JobStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn status_of(&self, label: &str) -> Option<JobStatus> {
        self.results
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.status)
    }
}

/// Command to merge every album folder under a library root
pub struct MergeCommand {
    music_root: PathBuf,
    config: Config,
}

impl MergeCommand {
    pub fn new(music_root: PathBuf, config: Config) -> Self {
        Self { music_root, config }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.music_root.join(OUTPUT_DIR_NAME)
    }

    pub async fn execute(&self) -> Result<MergeReport> {
        let start_time = Instant::now();

        // Checked before create_dir_all, which would otherwise create a missing library
        if !self.music_root.exists() {
            return Err(anyhow!(
                "Music directory does not exist: {:?}",
                self.music_root
            ));
        }

        if !self.music_root.is_dir() {
            return Err(anyhow!("Path is not a directory: {:?}", self.music_root));
        }

        // Created once here so workers never race on it
        let output_dir = self.output_dir();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("Failed to create output directory {output_dir:?}"))?;

        let jobs = discover_jobs(&self.music_root, &output_dir, &self.config.output_extension)?;
        info!(
            "🔎 Found {} album folders in {:?}, merging with {} workers",
            jobs.len(),
            self.music_root,
            self.config.max_workers
        );

        let scheduler = BatchScheduler::new(
            AlbumWorker::new(self.config.clone()),
            self.config.max_workers,
        );
        let progress = BatchScheduler::progress_bar(jobs.len());
        let mut results = scheduler.run(jobs, &progress).await;
        results.sort_by(|a, b| a.label.cmp(&b.label));

        let report = MergeReport {
            output_dir,
            results,
            elapsed: start_time.elapsed(),
        };

        info!(
            "✅ Merge complete. {} albums in {:.2}s",
            report.results.len(),
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    /// Print one status line per album and the summary to stdout
    pub fn print_report(&self, report: &MergeReport) {
        println!();
        for result in &report.results {
            println!("{result}");
        }

        println!(
            "\nProcessing complete! {} succeeded, {} failed, {} skipped",
            report.count(JobStatus::Success),
            report.count(JobStatus::Error),
            report.count(JobStatus::Skipped)
        );
        println!("Output folder: {}", report.output_dir.display());
    }
}
