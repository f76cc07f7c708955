//! Unit tests for explicit traversal positions

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use uml_xattrcred::services::position::Position;

#[test]
fn child_extends_path_and_depth() {
    let root = Position::root(Path::new("/srv/tree"));
    let child = root.child(OsStr::new("sub")).child(OsStr::new("deeper"));

    assert_eq!(root.depth(), 0);
    assert_eq!(child.depth(), 2);
    assert_eq!(child.path(), Path::new("/srv/tree/sub/deeper"));
    // The parent is untouched by descending.
    assert_eq!(root.path(), Path::new("/srv/tree"));
}

#[test]
fn self_entry_resolves_to_the_position() {
    let root = Position::root(Path::new("/srv/tree"));
    assert_eq!(root.entry_path(OsStr::new(".")), PathBuf::from("/srv/tree"));
    assert_eq!(
        root.entry_path(OsStr::new("file")),
        PathBuf::from("/srv/tree/file")
    );
}

#[test]
fn invocation_position_resolves_relative_names() {
    let here = Position::invocation();
    assert_eq!(here.entry_path(OsStr::new(".")), PathBuf::from("."));
    assert_eq!(here.entry_path(OsStr::new("x")), PathBuf::from("x"));
    assert_eq!(
        here.describe(),
        std::env::current_dir().unwrap().display().to_string()
    );
}

#[test]
fn relative_positions_are_described_absolutely() {
    let relative = Position::root(Path::new("some/relative/dir"));
    let described = relative.describe();
    assert!(described.starts_with('/'), "got {described}");
    assert!(described.ends_with("some/relative/dir"));
}
