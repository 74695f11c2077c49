use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::ffmpeg::{EncodeOutcome, FFmpegProcessor};
use crate::job::{AlbumJob, JobResult, JobStatus};
use crate::manifest::{Manifest, TrackSet};

/// Merges a single album: list tracks, write the manifest, run the encoder.
///
/// `process` never fails: every problem is folded into the album's
/// [`JobStatus`] so one bad folder cannot stop its siblings.
#[derive(Debug, Clone)]
pub struct AlbumWorker {
    processor: FFmpegProcessor,
    extensions: Vec<String>,
}

impl AlbumWorker {
    pub fn new(config: Config) -> Self {
        let extensions = config.extensions.clone();
        Self {
            processor: FFmpegProcessor::new(config),
            extensions,
        }
    }

    pub async fn process(&self, job: AlbumJob) -> JobResult {
        let status = match self.run(&job).await {
            Ok(status) => status,
            Err(e) => {
                warn!("❌ {}: {:#}", job.label, e);
                JobStatus::Error
            }
        };

        job.finish(status)
    }

    async fn run(&self, job: &AlbumJob) -> Result<JobStatus> {
        let tracks = TrackSet::scan(&job.source_dir, &self.extensions)?;

        // Lives until the end of this function, removed on every return path
        let Some(manifest) = Manifest::write(&tracks, job.dir_name()).await? else {
            info!("⏭️ Skipping {}: no audio files", job.label);
            return Ok(JobStatus::Skipped);
        };

        debug!(
            "Merging {} tracks for {} ({:?} profile)",
            tracks.len(),
            job.label,
            self.processor.profile()
        );
        match self
            .processor
            .encode(manifest.path(), manifest.first_track(), &job.output_path)
            .await
        {
            EncodeOutcome::Success => {
                info!("✅ Merged {} -> {:?}", job.label, job.output_path);
                Ok(JobStatus::Success)
            }
            EncodeOutcome::Failed(status) => {
                warn!("❌ FFmpeg failed for {} ({})", job.label, status);
                Ok(JobStatus::Error)
            }
            EncodeOutcome::Unavailable(e) => Err(anyhow!("Could not start encoder: {e}")),
        }
    }
}
