use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::warn;

/// Audio extensions recognised as album tracks (matched case-insensitively)
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg"];

/// How the encoder command is assembled for one album
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeProfile {
    /// Concatenate the manifest only, metadata taken from the concat input
    Concat,
    /// Take metadata and cover art from the first track, audio from the manifest
    CoverArt,
}

impl FromStr for EncodeProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "concat" | "simple" => Ok(Self::Concat),
            "cover-art" | "cover_art" | "coverart" => Ok(Self::CoverArt),
            other => Err(anyhow!(
                "Unknown encode profile '{other}'. Available: concat, cover-art"
            )),
        }
    }
}

/// Configuration for FFmpeg and application behavior
#[derive(Debug, Clone)]
pub struct Config {
    pub ffmpeg_bin: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub output_extension: String,
    pub profile: EncodeProfile,
    pub extensions: Vec<String>,
    pub max_workers: usize,
    /// Run the encoder under `nice -n 19`
    pub low_priority: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ffmpeg_bin: env::var("ALBUMCAT_FFMPEG").unwrap_or(defaults.ffmpeg_bin),
            audio_codec: env::var("ALBUMCAT_AUDIO_CODEC").unwrap_or(defaults.audio_codec),
            audio_bitrate: env::var("ALBUMCAT_AUDIO_BITRATE").unwrap_or(defaults.audio_bitrate),
            output_extension: env::var("ALBUMCAT_OUTPUT_EXT")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(defaults.output_extension),
            profile: parse_or("ALBUMCAT_PROFILE", defaults.profile),
            extensions: env::var("ALBUMCAT_EXTENSIONS")
                .ok()
                .map(|list| parse_extensions(&list))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.extensions),
            max_workers: parse_or::<usize>("ALBUMCAT_JOBS", defaults.max_workers).max(1),
            low_priority: env::var("ALBUMCAT_LOW_PRIORITY")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.low_priority),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "256k".to_string(),
            output_extension: "m4a".to_string(),
            profile: EncodeProfile::CoverArt,
            extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_workers: default_workers(),
            low_priority: false,
        }
    }
}

/// One worker per available core, each running a single encoder process
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Ignoring invalid {}={:?}: {}", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
