//! Track listing and the transient concat manifest.
//!
//! A [`Manifest`] owns its file on disk: dropping the value removes the file,
//! so every exit path of the worker (success, encoder failure, early `?`
//! return or panic unwind) leaves the album folder as it found it.
//!
//! Track and folder names are kept as raw `OsString`s all the way into the
//! manifest, so names that are not valid UTF-8 still reach the encoder intact.

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Sorted audio files found directly inside one album folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSet {
    dir: PathBuf,
    tracks: Vec<OsString>,
}

impl TrackSet {
    /// List regular files in `dir` whose extension is in `extensions` (case-insensitive).
    pub fn scan(dir: &Path, extensions: &[String]) -> Result<Self> {
        let mut tracks = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("Failed to list album folder {dir:?}"))?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let matches = path.extension().is_some_and(|ext| {
                let ext = ext.to_string_lossy();
                extensions.iter().any(|known| ext.eq_ignore_ascii_case(known))
            });

            if matches {
                tracks.push(entry.file_name().to_os_string());
            }
        }

        tracks.sort();

        Ok(Self {
            dir: dir.to_path_buf(),
            tracks,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[OsString] {
        &self.tracks
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the first track, used as metadata and cover art source
    pub fn first_track(&self) -> Option<PathBuf> {
        self.tracks.first().map(|name| self.dir.join(name))
    }
}

#[cfg(unix)]
fn name_bytes(name: &OsStr) -> Result<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Ok(name.as_bytes())
}

#[cfg(not(unix))]
fn name_bytes(name: &OsStr) -> Result<&[u8]> {
    name.to_str()
        .map(str::as_bytes)
        .with_context(|| format!("Track name is not valid Unicode: {name:?}"))
}

/// Render one manifest line. Embedded `'` are closed, escaped and reopened.
pub fn escape_entry(name: &OsStr) -> Result<Vec<u8>> {
    let mut line = b"file '".to_vec();
    for &byte in name_bytes(name)? {
        if byte == b'\'' {
            line.extend_from_slice(b"'\\''");
        } else {
            line.push(byte);
        }
    }
    line.push(b'\'');
    Ok(line)
}

/// Concat demuxer input list, deleted on drop
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    first_track: PathBuf,
}

impl Manifest {
    /// Manifest file name for an album folder, namespaced so concurrent albums never collide
    pub fn file_name(dir_name: &OsStr) -> OsString {
        let mut name = OsString::from("list_");
        name.push(dir_name);
        name.push(".txt");
        name
    }

    pub fn render(tracks: &TrackSet) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for name in tracks.tracks() {
            content.extend(escape_entry(name)?);
            content.push(b'\n');
        }
        Ok(content)
    }

    /// Write the manifest for `tracks` into the album folder.
    ///
    /// Returns `None` without touching the disk when there is nothing to merge.
    /// The guard is armed before the write, so a partially written file is
    /// still removed when this returns an error.
    pub async fn write(tracks: &TrackSet, dir_name: &OsStr) -> Result<Option<Self>> {
        let Some(first_track) = tracks.first_track() else {
            return Ok(None);
        };
        let content = Self::render(tracks)?;

        let manifest = Self {
            path: tracks.dir().join(Self::file_name(dir_name)),
            first_track,
        };

        tokio::fs::write(&manifest.path, content)
            .await
            .with_context(|| format!("Failed to write manifest {:?}", manifest.path))?;

        debug!("Wrote manifest with {} tracks: {:?}", tracks.len(), manifest.path);
        Ok(Some(manifest))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First listed track, the source of tags and cover art
    pub fn first_track(&self) -> &Path {
        &self.first_track
    }
}

impl Drop for Manifest {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed manifest: {:?}", self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove manifest {:?}: {}", self.path, e),
        }
    }
}
