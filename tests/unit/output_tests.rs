//! Unit tests for run summaries and exit status

use uml_xattrcred::cli::output::{exit_status, failure_breakdown, format_summary};
use uml_xattrcred::{Diagnostic, DiagnosticKind, Error, WalkReport};

fn diagnostic(kind: DiagnosticKind) -> Diagnostic {
    Diagnostic::new(kind, "/srv", Some("x".to_string()), "message")
}

#[test]
fn breakdown_uses_counts_when_diagnostics_are_discarded() {
    let mut report = WalkReport::new(true);
    report.record(diagnostic(DiagnosticKind::StatFailed));
    report.record(diagnostic(DiagnosticKind::StatFailed));
    report.record(diagnostic(DiagnosticKind::EnterFailed));
    report.record(diagnostic(DiagnosticKind::Skipped));

    assert!(report.diagnostics.is_empty());
    assert_eq!(
        failure_breakdown(&report),
        vec![(DiagnosticKind::StatFailed, 2), (DiagnosticKind::EnterFailed, 1)]
    );
    assert_eq!(report.failures, 3);
    assert_eq!(report.entries_skipped, 1);
}

#[test]
fn summary_mentions_failures_only_when_present() {
    let mut report = WalkReport::default();
    report.root = "/srv".to_string();
    report.entries_processed = 3;
    report.entries_encoded = 3;
    assert_eq!(
        format_summary(&report),
        "/srv: 3 entries processed, 3 annotated, 0 skipped"
    );

    report.record(diagnostic(DiagnosticKind::AttributeWriteFailed));
    assert!(format_summary(&report).ends_with(", 1 failed"));
}

#[test]
fn only_fatal_errors_fail_the_run() {
    let mut report = WalkReport::default();
    report.record(diagnostic(DiagnosticKind::OpenFailed));
    assert_eq!(exit_status(&Ok(report)), 0);

    let fatal = Error::ProtocolInvariantViolation {
        path: "/srv/odd".to_string(),
        detail: "got an unexpected size of umlcred attribute (23 > 22)".to_string(),
    };
    assert_eq!(exit_status(&Err(fatal)), 1);
}
