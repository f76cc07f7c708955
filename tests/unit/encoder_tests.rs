//! Unit tests for the per-entry encoder with scripted backends

use crate::fixtures::{RefusingStore, ScriptedQuery};
use std::ffi::OsStr;
use std::path::Path;
use uml_xattrcred::services::attrs::EntryMetadata;
use uml_xattrcred::services::encode::{CRED_ATTR, Encoder, MODE_ATTR};
use uml_xattrcred::services::position::Position;
use uml_xattrcred::{DiagnosticKind, Error, WalkReport};

const DIR: &str = "/virtual/dir";

fn encode(
    query: ScriptedQuery,
    store: RefusingStore,
    name: &str,
) -> (RefusingStore, WalkReport, Result<(), Error>) {
    let mut encoder = Encoder::new(query, store);
    let mut report = WalkReport::default();
    // The scripted backends key by path and never touch the handle.
    let result = encoder.encode_and_store(
        &Position::root(Path::new(DIR)),
        rustix::fs::CWD,
        OsStr::new(name),
        &mut report,
    );
    (encoder.into_store(), report, result)
}

#[test]
fn writes_both_attributes() {
    let query = ScriptedQuery::default()
        .with("/virtual/dir/file", EntryMetadata::new(1000, 1000, 0o100_644));
    let (store, report, result) = encode(query, RefusingStore::default(), "file");

    assert!(result.is_ok());
    assert_eq!(store.written.len(), 2);
    assert_eq!(store.written[0].1, CRED_ATTR);
    assert_eq!(store.written[0].2, b"1000,1000\0");
    assert_eq!(store.written[1].1, MODE_ATTR);
    assert_eq!(store.written[1].2, b"0644\0");
    assert_eq!(report.entries_encoded, 1);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn self_entry_targets_the_directory() {
    let query = ScriptedQuery::default().with(DIR, EntryMetadata::new(0, 0, 0o040_700));
    let (store, _, result) = encode(query, RefusingStore::default(), ".");

    assert!(result.is_ok());
    assert!(store.written.iter().all(|(path, _, _)| path == Path::new(DIR)));
    assert_eq!(store.written[1].2, b"0700\0");
}

#[test]
fn stat_failure_is_logged_and_nothing_written() {
    let (store, report, result) =
        encode(ScriptedQuery::default(), RefusingStore::default(), "gone");

    assert!(result.is_ok());
    assert!(store.written.is_empty());
    let diagnostic = report.diagnostics_of(DiagnosticKind::StatFailed).next().unwrap();
    assert_eq!(diagnostic.position, DIR);
    assert_eq!(diagnostic.entry.as_deref(), Some("gone"));
    assert!(diagnostic.message.starts_with("Failed to stat /virtual/dir/gone: "));
    assert_eq!(report.failures, 1);
}

#[test]
fn partial_metadata_is_logged_and_nothing_written() {
    let partial = EntryMetadata {
        uid: Some(1),
        gid: None,
        mode: Some(0o644),
    };
    let query = ScriptedQuery::default().with("/virtual/dir/nfs", partial);
    let (store, report, result) = encode(query, RefusingStore::default(), "nfs");

    assert!(result.is_ok());
    assert!(store.written.is_empty());
    let diagnostic = report.diagnostics_of(DiagnosticKind::PartialMetadata).next().unwrap();
    assert!(diagnostic.message.contains("didn't return full UID,GID,mode info"));
}

#[test]
fn failed_mode_write_leaves_cred_in_place() {
    let query =
        ScriptedQuery::default().with("/virtual/dir/file", EntryMetadata::new(5, 6, 0o600));
    let store = RefusingStore {
        refuse: Some(MODE_ATTR),
        ..RefusingStore::default()
    };
    let (store, report, result) = encode(query, store, "file");

    assert!(result.is_ok());
    assert_eq!(store.written.len(), 1);
    assert_eq!(store.written[0].1, CRED_ATTR);
    let diagnostic = report.diagnostics_of(DiagnosticKind::AttributeWriteFailed).next().unwrap();
    assert!(diagnostic.message.starts_with("user.umlmode setxattr failed on /virtual/dir/file"));
    assert_eq!(report.entries_encoded, 0);
}

#[test]
fn failed_cred_write_skips_mode() {
    let query =
        ScriptedQuery::default().with("/virtual/dir/file", EntryMetadata::new(5, 6, 0o600));
    let store = RefusingStore {
        refuse: Some(CRED_ATTR),
        ..RefusingStore::default()
    };
    let (store, report, _) = encode(query, store, "file");

    assert!(store.written.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn oversized_mode_is_a_protocol_violation() {
    let query = ScriptedQuery::default()
        .with("/virtual/dir/odd", EntryMetadata::new(0, 0, 0o1_000_644));
    let (store, report, result) = encode(query, RefusingStore::default(), "odd");

    match result {
        Err(Error::ProtocolInvariantViolation { path, detail }) => {
            assert_eq!(path, "/virtual/dir/odd");
            assert!(detail.contains("octal digits"));
        }
        other => panic!("expected protocol violation, got {other:?}"),
    }
    assert!(store.written.is_empty());
    assert!(report.diagnostics.is_empty());
}
