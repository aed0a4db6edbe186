//! Document discovery by filesystem walking.
//!
//! The Scanner only identifies files that look like documents by extension.
//! It never reads their content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Discovers documents by walking the filesystem.
#[derive(Debug, Clone)]
pub struct Scanner {
    extensions: Vec<String>,
}

impl Scanner {
    /// Create a new Scanner.
    ///
    /// # Arguments
    ///
    /// * `extensions` - Document file extensions without the dot (e.g., `["md", "markdown"]`)
    pub fn new<S: Into<String>>(extensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a path has a document extension.
    #[must_use]
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| ext == e.as_str()))
    }

    /// Scan a directory and every subdirectory.
    ///
    /// Hidden entries are included. Unreadable subdirectories are skipped with
    /// a warning; only an unreadable top-level directory is an error.
    pub fn scan_recursive(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut documents = Vec::new();
        let mut subdirs = Vec::new();
        self.scan_directory(root, &mut documents, &mut subdirs)?;

        while let Some(dir) = subdirs.pop() {
            if let Err(e) = self.scan_directory(&dir, &mut documents, &mut subdirs) {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory, skipping");
            }
        }

        documents.sort();
        Ok(documents)
    }

    /// Scan a single directory without descending into subdirectories.
    pub fn scan_flat(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut documents = Vec::new();
        let mut ignored = Vec::new();
        self.scan_directory(dir, &mut documents, &mut ignored)?;
        documents.sort();
        Ok(documents)
    }

    /// Collect documents of one directory and queue its subdirectories.
    fn scan_directory(
        &self,
        dir: &Path,
        documents: &mut Vec<PathBuf>,
        subdirs: &mut Vec<PathBuf>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();

            if file_type.is_dir() {
                subdirs.push(path);
            } else if self.is_document(&path) {
                documents.push(path);
            }
        }
        Ok(())
    }
}
