use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error};

use crate::job::{AlbumJob, JobResult, JobStatus};
use crate::worker::AlbumWorker;

/// Runs album jobs on a bounded pool and gathers results as they finish
pub struct BatchScheduler {
    worker: Arc<AlbumWorker>,
    max_workers: usize,
}

impl BatchScheduler {
    pub fn new(worker: AlbumWorker, max_workers: usize) -> Self {
        Self {
            worker: Arc::new(worker),
            max_workers: max_workers.max(1),
        }
    }

    /// Progress bar styled for album merging, sized to `total` jobs
    pub fn progress_bar(total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{msg}: {percent:>3}%|{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}] albums",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Merging Albums");
        pb
    }

    /// Process every job, at most `max_workers` at a time.
    ///
    /// Results are returned in completion order. A job that panics is
    /// reported as [`JobStatus::Error`] and does not affect the others.
    pub async fn run(&self, jobs: Vec<AlbumJob>, progress: &ProgressBar) -> Vec<JobResult> {
        let total = jobs.len();
        let mut results = Vec::with_capacity(total);
        let mut pending = jobs.into_iter();
        let mut running = JoinSet::new();
        let mut labels: HashMap<Id, String> = HashMap::new();

        debug!(
            "Scheduling {} albums on {} workers",
            total, self.max_workers
        );

        for job in pending.by_ref().take(self.max_workers) {
            self.spawn(&mut running, &mut labels, job);
        }

        while let Some(joined) = running.join_next_with_id().await {
            let result = match joined {
                Ok((id, result)) => {
                    labels.remove(&id);
                    result
                }
                Err(e) => {
                    let label = labels.remove(&e.id()).unwrap_or_default();
                    error!("Worker for {} crashed: {}", label, e);
                    JobResult::new(label, JobStatus::Error)
                }
            };

            progress.inc(1);
            results.push(result);

            if let Some(job) = pending.next() {
                self.spawn(&mut running, &mut labels, job);
            }
        }

        progress.finish();
        results
    }

    fn spawn(
        &self,
        running: &mut JoinSet<JobResult>,
        labels: &mut HashMap<Id, String>,
        job: AlbumJob,
    ) {
        let worker = Arc::clone(&self.worker);
        let label = job.label.clone();
        let handle = running.spawn(async move { worker.process(job).await });
        labels.insert(handle.id(), label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::job::OUTPUT_DIR_NAME;
    use serial_test::serial;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn album(root: &Path, name: &str, tracks: &[&str]) -> AlbumJob {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for track in tracks {
            fs::write(dir.join(track), "audio").unwrap();
        }
        AlbumJob::new(dir, &root.join(OUTPUT_DIR_NAME), "m4a")
    }

    fn scheduler(bin: &str, max_workers: usize) -> BatchScheduler {
        let worker = AlbumWorker::new(Config {
            ffmpeg_bin: bin.to_string(),
            ..Config::default()
        });
        BatchScheduler::new(worker, max_workers)
    }

    /// Write an executable `/bin/sh` encoder stand-in into `dir`
    #[cfg(unix)]
    fn script_encoder(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ffmpeg");
        fs::write(&script, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let progress = ProgressBar::hidden();
        let results = scheduler("true", 4).run(Vec::new(), &progress).await;
        assert!(results.is_empty());
        assert_eq!(progress.position(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_every_job_reported_with_small_pool() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let jobs: Vec<AlbumJob> = (0..7)
            .map(|i| {
                if i % 3 == 0 {
                    album(root, &format!("Empty {i}"), &[])
                } else {
                    album(root, &format!("Album {i}"), &["01.mp3", "02.mp3"])
                }
            })
            .collect();

        let progress = ProgressBar::hidden();
        let mut results = scheduler("true", 2).run(jobs, &progress).await;
        results.sort_by(|a, b| a.label.cmp(&b.label));

        assert_eq!(results.len(), 7);
        assert_eq!(progress.position(), 7);
        for result in &results {
            let expected = if result.label.starts_with("Empty") {
                JobStatus::Skipped
            } else {
                JobStatus::Success
            };
            assert_eq!(result.status, expected, "unexpected status for {}", result.label);
        }
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let jobs = vec![
            album(root, "Broken", &["01.mp3"]),
            album(root, "Nothing", &[]),
        ];

        let progress = ProgressBar::hidden();
        let mut results = scheduler("/nonexistent/bin/ffmpeg", 1)
            .run(jobs, &progress)
            .await;
        results.sort_by(|a, b| a.label.cmp(&b.label));

        assert_eq!(
            results,
            vec![
                JobResult::new("Broken", JobStatus::Error),
                JobResult::new("Nothing", JobStatus::Skipped),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_never_more_than_max_workers_encoders() {
        let tools = TempDir::new().unwrap();
        let state = tools.path().join("state");
        fs::create_dir_all(state.join("running")).unwrap();
        // Each encoder records how many encoders are alive while it runs
        let encoder = script_encoder(
            tools.path(),
            &format!(
                "state='{}'\n\
                 touch \"$state/running/$$\"\n\
                 ls \"$state/running\" | wc -l >> \"$state/peaks\"\n\
                 sleep 0.3\n\
                 rm -f \"$state/running/$$\"\n",
                state.display()
            ),
        );

        let temp_dir = TempDir::new().unwrap();
        let jobs: Vec<AlbumJob> = (0..6)
            .map(|i| album(temp_dir.path(), &format!("Album {i}"), &["01.mp3"]))
            .collect();

        let progress = ProgressBar::hidden();
        let results = scheduler(&encoder, 2).run(jobs, &progress).await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.status == JobStatus::Success));

        let peaks: Vec<usize> = fs::read_to_string(state.join("peaks"))
            .unwrap()
            .lines()
            .map(|line| line.trim().parse().unwrap())
            .collect();
        assert_eq!(peaks.len(), 6);
        assert!(
            peaks.iter().all(|&alive| alive <= 2),
            "more than two encoders alive at once: {peaks:?}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_results_arrive_in_completion_order() {
        let tools = TempDir::new().unwrap();
        let encoder = script_encoder(tools.path(), "case \"$*\" in */Slow/*) sleep 1 ;; esac\n");

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let jobs = vec![
            album(root, "Slow", &["01.mp3"]),
            album(root, "Fast", &["01.mp3"]),
        ];

        let progress = ProgressBar::hidden();
        let results = scheduler(&encoder, 2).run(jobs, &progress).await;

        // Submitted first, reported last
        assert_eq!(
            results,
            vec![
                JobResult::new("Fast", JobStatus::Success),
                JobResult::new("Slow", JobStatus::Success),
            ]
        );
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        assert_eq!(scheduler("true", 0).max_workers, 1);
    }
}
