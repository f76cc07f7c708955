//! Output formatting for CLI

use crate::models::{DiagnosticKind, WalkReport};
use std::io::Write;

/// One-line human summary of a finished walk.
#[must_use]
pub fn format_summary(report: &WalkReport) -> String {
    let mut line = format!(
        "{}: {} entries processed, {} annotated, {} skipped",
        report.root, report.entries_processed, report.entries_encoded, report.entries_skipped
    );
    if report.failures > 0 {
        line.push_str(&format!(", {} failed", report.failures));
    }
    line
}

/// Failure count per kind, in a stable order, omitting empty kinds.
#[must_use]
pub fn failure_breakdown(report: &WalkReport) -> Vec<(DiagnosticKind, u64)> {
    report
        .counts
        .iter()
        .filter(|(kind, count)| kind.is_failure() && **count > 0)
        .map(|(kind, count)| (*kind, *count))
        .collect()
}

/// Process exit status for a finished run: per-entry failures still count
/// as success, only a fatal error does not.
#[must_use]
pub fn exit_status(result: &crate::Result<WalkReport>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Write the JSON report followed by a newline.
///
/// # Errors
/// Returns [`crate::Error::Io`] if the writer fails.
pub fn write_json<W: Write>(mut writer: W, report: &WalkReport) -> crate::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    Ok(())
}
