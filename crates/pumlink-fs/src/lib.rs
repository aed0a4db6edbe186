//! Document discovery for pumlink.
//!
//! Resolves a [`Target`] into the list of documents to rewrite:
//!
//! 1. [`Target::File`]: one explicit document, validated up front
//! 2. [`Target::Dir`]: every document under a directory, recursively
//! 3. [`Target::CurrentDir`]: documents in the working directory, non-recursively
//!
//! Only explicit targets can be invalid. Walking a directory that contains no
//! documents simply yields nothing.

mod scanner;

use std::io;
use std::path::{Path, PathBuf};

pub use scanner::Scanner;

/// Which documents to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single named document.
    File(PathBuf),
    /// A directory tree, walked recursively.
    Dir(PathBuf),
    /// The current directory, not recursive.
    CurrentDir,
}

impl Target {
    /// Pick the target from optional CLI arguments; `file` wins over `dir`.
    #[must_use]
    pub fn from_args(file: Option<PathBuf>, dir: Option<PathBuf>) -> Self {
        match (file, dir) {
            (Some(file), _) => Self::File(file),
            (None, Some(dir)) => Self::Dir(dir),
            (None, None) => Self::CurrentDir,
        }
    }
}

/// Error resolving a target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Explicit file does not exist.
    #[error("{} does not exist", .0.display())]
    FileNotFound(PathBuf),
    /// Explicit file is not a regular file or lacks a document extension.
    #[error("{} is not a valid markdown file", .0.display())]
    NotADocument(PathBuf),
    /// Explicit directory does not exist or is not a directory.
    #[error("{} is not a valid directory", .0.display())]
    NotADirectory(PathBuf),
    /// Directory could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Scanner {
    /// Resolve a target into document paths, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError`] if an explicit file or directory is invalid, or
    /// if the top-level directory cannot be read.
    pub fn resolve(&self, target: &Target) -> Result<Vec<PathBuf>, TargetError> {
        match target {
            Target::File(path) => {
                if !path.exists() {
                    return Err(TargetError::FileNotFound(path.clone()));
                }
                if !path.is_file() || !self.is_document(path) {
                    return Err(TargetError::NotADocument(path.clone()));
                }
                Ok(vec![path.clone()])
            }
            Target::Dir(dir) => {
                if !dir.is_dir() {
                    return Err(TargetError::NotADirectory(dir.clone()));
                }
                self.scan_recursive(dir).map_err(|source| TargetError::Io {
                    path: dir.clone(),
                    source,
                })
            }
            Target::CurrentDir => {
                let cwd = Path::new(".");
                let documents = self.scan_flat(cwd).map_err(|source| TargetError::Io {
                    path: cwd.to_path_buf(),
                    source,
                })?;
                // Bare file names, as typed by the user.
                Ok(documents
                    .into_iter()
                    .map(|p| p.strip_prefix(cwd).map(Path::to_path_buf).unwrap_or(p))
                    .collect())
            }
        }
    }
}
