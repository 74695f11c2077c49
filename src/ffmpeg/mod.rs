use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

use crate::config::{Config, EncodeProfile};

/// What happened when the encoder was run for one album
#[derive(Debug)]
pub enum EncodeOutcome {
    Success,
    /// The encoder ran and exited with a non-zero status
    Failed(ExitStatus),
    /// The encoder could not be started at all
    Unavailable(io::Error),
}

impl EncodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EncodeOutcome::Success)
    }
}

/// FFmpeg wrapper that merges one album per invocation
#[derive(Debug, Clone)]
pub struct FFmpegProcessor {
    config: Config,
}

impl FFmpegProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn profile(&self) -> EncodeProfile {
        self.config.profile
    }

    /// Merge the tracks listed in `manifest` into `output_path`.
    ///
    /// Output of the encoder is discarded so it cannot tear the progress bar;
    /// only the exit status is kept.
    pub async fn encode(
        &self,
        manifest: &Path,
        first_track: &Path,
        output_path: &Path,
    ) -> EncodeOutcome {
        let mut cmd = self.build_command(manifest, first_track, output_path);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        debug!("Executing FFmpeg command: {:?}", cmd);

        match cmd.status().await {
            Ok(status) if status.success() => EncodeOutcome::Success,
            Ok(status) => EncodeOutcome::Failed(status),
            Err(e) => EncodeOutcome::Unavailable(e),
        }
    }

    /// Build the full command for one album, including the `nice` wrapper if configured
    pub fn build_command(&self, manifest: &Path, first_track: &Path, output_path: &Path) -> Command {
        let mut cmd = self.build_base_command();
        cmd.args(self.encode_args(manifest, first_track, output_path));
        cmd
    }

    /// Build base FFmpeg command with common options
    fn build_base_command(&self) -> Command {
        if self.config.low_priority {
            let mut c = Command::new("nice");
            c.args(["-n", "19"]);
            c.arg(&self.config.ffmpeg_bin);
            c
        } else {
            Command::new(&self.config.ffmpeg_bin)
        }
    }

    /// Arguments passed to ffmpeg for the configured profile
    pub fn encode_args(&self, manifest: &Path, first_track: &Path, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into()];

        match self.config.profile {
            EncodeProfile::Concat => {
                self.add_concat_input(&mut args, manifest);
                self.add_audio_options(&mut args);
                args.extend(["-map_metadata", "0"].map(OsString::from));
            }
            EncodeProfile::CoverArt => {
                // Input 0 carries tags and cover art, input 1 the joined audio
                args.push("-i".into());
                args.push(first_track.into());
                self.add_concat_input(&mut args, manifest);
                args.extend(["-map", "1:a", "-map", "0:v?", "-map_metadata", "0"].map(OsString::from));
                self.add_audio_options(&mut args);
                args.extend(
                    ["-c:v", "copy", "-disposition:v:0", "attached_pic"].map(OsString::from),
                );
            }
        }

        args.push(output_path.into());
        args
    }

    fn add_concat_input(&self, args: &mut Vec<OsString>, manifest: &Path) {
        args.extend(["-f", "concat", "-safe", "0", "-i"].map(OsString::from));
        args.push(manifest.into());
    }

    fn add_audio_options(&self, args: &mut Vec<OsString>) {
        args.push("-c:a".into());
        args.push(self.config.audio_codec.as_str().into());
        args.push("-b:a".into());
        args.push(self.config.audio_bitrate.as_str().into());
    }
}
