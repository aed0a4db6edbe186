//! Documents and their place in the repository.

use std::io;
use std::path::{Path, PathBuf};

/// A markdown document selected for rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Filesystem path of the document.
    pub path: PathBuf,
    /// Directory of the document relative to the repository root.
    ///
    /// Artifact URLs are built from this path, so it must match the
    /// repository layout on the hosting service.
    pub repo_dir: PathBuf,
}

impl Document {
    /// Create a document with an explicit repository-relative directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            repo_dir: repo_dir.into(),
        }
    }

    /// Create a document, deriving its repository directory from `root`.
    ///
    /// Both paths are made absolute against the working directory without
    /// touching the filesystem. A document outside `root` keeps its own
    /// directory as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined.
    pub fn in_repository(path: impl Into<PathBuf>, root: &Path) -> io::Result<Self> {
        let path = path.into();
        let dir = parent_dir(&path);
        let abs_dir = std::path::absolute(dir)?;
        let abs_root = std::path::absolute(root)?;

        let repo_dir = if let Ok(rel) = abs_dir.strip_prefix(&abs_root) {
            rel.to_path_buf()
        } else {
            tracing::warn!(
                document = %path.display(),
                root = %root.display(),
                "Document is outside the repository root"
            );
            dir.to_path_buf()
        };

        Ok(Self { path, repo_dir })
    }

    /// Directory containing the document (artifacts are written here).
    #[must_use]
    pub fn dir(&self) -> &Path {
        parent_dir(&self.path)
    }
}

/// Parent directory, with `.` for bare file names.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
