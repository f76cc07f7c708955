//! UML hostfs credential library
//!
//! This library walks a directory tree and stores the ownership (uid, gid) and
//! permission bits of every directory and regular file as extended attributes
//! (`user.umlcred`, `user.umlmode`), the format User-Mode Linux hostfs reads
//! back when it runs on a backing store that cannot keep that metadata itself.

pub mod cli;
pub mod models;
pub mod services;

pub use models::{Diagnostic, DiagnosticKind, WalkReport};
pub use services::encode::{ModeRecord, OwnershipRecord};
#[cfg(unix)]
pub use services::traverse::{EntryKind, SpecialKind, Walker};

use std::path::Path;
use std::result;

/// Custom error type for the library
///
/// Per-entry failures never show up here: they are logged and collected as
/// [`Diagnostic`]s in the [`WalkReport`]. Only conditions that must stop the
/// whole run are returned as errors.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// An encoded record did not fit its fixed bound. The attribute format
    /// cannot represent the entry, so continuing would leave the tree
    /// inconsistently annotated.
    ProtocolInvariantViolation { path: String, detail: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::ProtocolInvariantViolation { path, detail } => {
                write!(f, "On {path} {detail}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::ProtocolInvariantViolation { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Options for a walk
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Deepest directory level to descend into, the root being level 0.
    /// Subtrees below it are skipped with a diagnostic. `None` walks
    /// everything.
    pub max_depth: Option<u16>,
    /// Only count diagnostics instead of keeping them in the report. They
    /// are still logged.
    pub discard_diagnostics: bool,
}

/// Walk `root` and annotate every directory and regular file below it using
/// the platform metadata query and extended attribute backends.
///
/// # Errors
/// Returns [`Error::ProtocolInvariantViolation`] when an entry's metadata
/// cannot be represented in the attribute format. Every other failure is
/// recorded in the returned report.
#[cfg(unix)]
pub fn annotate_tree<P: AsRef<Path>>(root: P, opts: &WalkOptions) -> Result<WalkReport> {
    use services::attrs::stat::SystemMetadata;
    use services::attrs::xattr::XattrStore;

    let mut walker = Walker::new(SystemMetadata, XattrStore, opts.clone());
    walker.walk(root.as_ref())?;
    Ok(walker.into_report())
}
