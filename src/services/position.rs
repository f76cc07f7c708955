//! Explicit traversal position.
//!
//! The walker never changes the process working directory. Each recursion
//! frame owns the path of the directory it is in; a child frame gets its own
//! extended copy, so returning to the parent is just dropping the child.

use crate::models::UNKNOWN_POSITION;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    path: PathBuf,
    depth: u16,
}

impl Position {
    /// Position of the walk root, at depth 0.
    #[must_use]
    pub fn root(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            depth: 0,
        }
    }

    /// The invocation directory, used to report failures on the root itself.
    #[must_use]
    pub fn invocation() -> Self {
        Self {
            path: PathBuf::new(),
            depth: 0,
        }
    }

    /// Position one level below, inside the directory `name`.
    #[must_use]
    pub fn child(&self, name: &OsStr) -> Self {
        Self {
            path: self.path.join(name),
            depth: self.depth.saturating_add(1),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Path naming `name` inside this position; `.` resolves to the
    /// position itself. Only used to report and key entries, never to
    /// reach them.
    #[must_use]
    pub fn entry_path(&self, name: &OsStr) -> PathBuf {
        if name != OsStr::new(".") {
            return self.path.join(name);
        }
        if self.path.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            self.path.clone()
        }
    }

    /// Absolute form of the position for diagnostics, or
    /// [`UNKNOWN_POSITION`] when it cannot be resolved.
    #[must_use]
    pub fn describe(&self) -> String {
        let resolved = if self.path.as_os_str().is_empty() {
            std::env::current_dir()
        } else {
            std::path::absolute(&self.path)
        };
        resolved.map_or_else(
            |_| UNKNOWN_POSITION.to_string(),
            |path| path.display().to_string(),
        )
    }
}
