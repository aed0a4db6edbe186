//! Artifact emission.
//!
//! An artifact is the payload of one diagram block saved as a sibling file of
//! its document. Writing goes through [`ArtifactSink`] so the rewriter can run
//! against the filesystem or in dry-run mode.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Payload of a single block destined for a sibling file.
#[derive(Debug)]
pub struct Artifact<'a> {
    /// Directory of the owning document.
    pub dir: &'a Path,
    /// Generated file name (see [`artifact_file_name`](crate::artifact_file_name)).
    pub file_name: String,
    /// Block payload without fence lines.
    pub content: &'a str,
}

impl Artifact<'_> {
    /// Full path of the artifact file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Error writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact file could not be created or written.
    #[error("Failed to write artifact {}: {source}", path.display())]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Destination for extracted artifacts.
pub trait ArtifactSink {
    /// Persist the artifact and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the artifact cannot be stored.
    fn write(&self, artifact: &Artifact<'_>) -> Result<PathBuf, ArtifactError>;
}

/// Writes artifacts to the filesystem, overwriting existing files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsArtifactSink;

impl ArtifactSink for FsArtifactSink {
    fn write(&self, artifact: &Artifact<'_>) -> Result<PathBuf, ArtifactError> {
        let path = artifact.path();
        match fs::write(&path, artifact.content) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = artifact.content.len(), "Wrote artifact");
                Ok(path)
            }
            Err(source) => Err(ArtifactError::Io { path, source }),
        }
    }
}

/// Reports artifact paths without touching the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSink;

impl ArtifactSink for DryRunSink {
    fn write(&self, artifact: &Artifact<'_>) -> Result<PathBuf, ArtifactError> {
        Ok(artifact.path())
    }
}
