//! Data models for walk diagnostics and the run report

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder used when the traversal position cannot be resolved to an
/// absolute path.
pub const UNKNOWN_POSITION: &str = "<unknown>";

/// Classification of a non-fatal event encountered during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Metadata query for the entry failed.
    StatFailed,
    /// Metadata query succeeded but did not report uid, gid and mode.
    PartialMetadata,
    /// Writing one of the attributes failed.
    AttributeWriteFailed,
    /// A directory could not be entered.
    EnterFailed,
    /// A directory was entered but could not be opened for enumeration.
    OpenFailed,
    /// Enumeration stopped on an error before the end of the directory.
    ReadFailed,
    /// The subtree lies below the configured depth bound.
    DepthLimit,
    /// The entry is not a directory or regular file.
    Skipped,
}

impl DiagnosticKind {
    /// Whether the event is a failure, as opposed to an informational skip.
    #[must_use]
    pub fn is_failure(self) -> bool {
        !matches!(self, DiagnosticKind::Skipped)
    }
}

/// A single logged event, carrying the traversal position and entry it
/// happened on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Absolute traversal position, or [`UNKNOWN_POSITION`].
    pub position: String,
    pub entry: Option<String>,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        kind: DiagnosticKind,
        position: impl Into<String>,
        entry: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            position: position.into(),
            entry,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Summary of a walk: counters plus the diagnostics emitted on the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkReport {
    pub root: String,
    /// Directory entries looked at, `..` excluded.
    pub entries_processed: u64,
    /// Entries that received both attributes.
    pub entries_encoded: u64,
    /// Special entries left alone.
    pub entries_skipped: u64,
    pub failures: u64,
    /// Diagnostic count per kind, kept even when the diagnostics are not.
    pub counts: BTreeMap<DiagnosticKind, u64>,
    /// Empty when the report only counts.
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    discard_diagnostics: bool,
}

impl WalkReport {
    /// Empty report; with `discard_diagnostics` set, [`WalkReport::record`]
    /// only logs and counts, so memory stays flat on huge trees.
    #[must_use]
    pub fn new(discard_diagnostics: bool) -> Self {
        Self {
            discard_diagnostics,
            ..Self::default()
        }
    }

    /// Log a diagnostic at the level matching its kind and count it.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind.is_failure() {
            log::warn!("{diagnostic}");
            self.failures = self.failures.saturating_add(1);
        } else {
            log::info!("{diagnostic}");
            self.entries_skipped = self.entries_skipped.saturating_add(1);
        }
        let count = self.counts.entry(diagnostic.kind).or_default();
        *count = count.saturating_add(1);
        if !self.discard_diagnostics {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Kept diagnostics of one kind, in emission order.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    #[must_use]
    pub fn count_of(&self, kind: DiagnosticKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}
