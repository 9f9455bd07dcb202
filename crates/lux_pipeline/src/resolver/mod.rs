//! Flat path index over a scanned directory tree
//!
//! A [`Resolver`] is a point-in-time snapshot: it lists every regular file
//! under a root at scan time and never observes later filesystem changes.
//! Queries match by base name only, because the authoring tool records
//! absolute paths from the designer's machine that mean nothing on the
//! server.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while scanning or querying the file index
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The scan root could not be accessed
    #[error("failed to access '{}': {source}", .path.display())]
    Access {
        /// The root that was requested
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The scan root exists but is not a directory
    #[error("expected a directory at '{}'", .0.display())]
    NotADirectory(PathBuf),

    /// No indexed file matches the query
    #[error("unable to locate file '{0}' in the scanned tree")]
    NotFound(String),
}

/// Immutable snapshot of every regular file under a scanned root
///
/// Paths are stored slash-normalized in walk order. Rebuild with
/// [`Resolver::scan`] to observe filesystem changes.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    files: Vec<String>,
}

impl Resolver {
    /// Walk `root` and build a fresh snapshot
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self, ResolveError> {
        let root = root.as_ref();
        let meta = std::fs::metadata(root).map_err(|source| ResolveError::Access {
            path: root.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ResolveError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.push(entry.path().to_string_lossy().replace('\\', "/"));
                }
                Ok(_) => {}
                Err(err) => log::warn!("skipping unreadable entry under {}: {err}", root.display()),
            }
        }
        Ok(Self { files })
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over the indexed paths in walk order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Find the first indexed file whose base name matches `name`'s
    ///
    /// Directory components on both sides are ignored.
    pub fn get(&self, name: &str) -> Result<&str, ResolveError> {
        let wanted = base_name(name);
        self.files
            .iter()
            .find(|candidate| base_name(candidate) == wanted)
            .map(String::as_str)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }

    /// All indexed paths ending with `suffix`
    pub fn ends_with(&self, suffix: &str) -> Vec<&str> {
        self.files
            .iter()
            .filter(|p| p.ends_with(suffix))
            .map(String::as_str)
            .collect()
    }
}

/// Base-name component after slash normalization
fn base_name(path: &str) -> &str {
    let normalized = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    &path[normalized..]
}
