//! Test fixtures: directory trees and scripted backends

use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};
use uml_xattrcred::services::attrs::{AttributeStore, EntryMetadata, EntryRef, MetadataQuery};

/// Build `root/{a.txt, subdir/{b.txt}, link -> a.txt}` with `a.txt` at 0644
/// and `subdir` at 0750.
pub fn create_sample_tree(base: &Path) -> io::Result<PathBuf> {
    let root = base.join("root");
    fs::create_dir_all(root.join("subdir"))?;
    fs::write(root.join("a.txt"), b"alpha")?;
    fs::write(root.join("subdir/b.txt"), b"beta")?;
    symlink("a.txt", root.join("link"))?;

    fs::set_permissions(root.join("a.txt"), fs::Permissions::from_mode(0o644))?;
    fs::set_permissions(root.join("subdir"), fs::Permissions::from_mode(0o750))?;
    Ok(root)
}

/// Expected `user.umlcred` text for `path`, from the test's own `lstat`.
pub fn expected_cred(path: &Path) -> String {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::symlink_metadata(path).expect("lstat fixture");
    format!("{},{}", meta.uid(), meta.gid())
}

/// Expected `user.umlmode` text for `path`.
pub fn expected_mode(path: &Path) -> String {
    let meta = fs::symlink_metadata(path).expect("lstat fixture");
    format!("{:04o}", meta.permissions().mode() & 0o7777)
}

/// Metadata query answering from a fixed table keyed by entry path;
/// unknown paths fail.
#[derive(Default)]
pub struct ScriptedQuery {
    answers: HashMap<PathBuf, EntryMetadata>,
}

impl ScriptedQuery {
    pub fn with(mut self, path: impl Into<PathBuf>, metadata: EntryMetadata) -> Self {
        self.answers.insert(path.into(), metadata);
        self
    }
}

impl MetadataQuery for ScriptedQuery {
    fn query(&self, entry: EntryRef<'_>) -> io::Result<EntryMetadata> {
        self.answers
            .get(entry.path)
            .copied()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

/// Store that refuses one attribute name and records everything else.
#[derive(Default)]
pub struct RefusingStore {
    pub refuse: Option<&'static str>,
    pub written: Vec<(PathBuf, String, Vec<u8>)>,
}

impl AttributeStore for RefusingStore {
    fn set_attribute(&mut self, entry: EntryRef<'_>, name: &str, value: &[u8]) -> io::Result<()> {
        if self.refuse == Some(name) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.written
            .push((entry.path.to_path_buf(), name.to_string(), value.to_vec()));
        Ok(())
    }
}

/// Name of every level in [`create_deep_tree`].
pub fn deep_level_name() -> String {
    "d".repeat(250)
}

/// Build `levels` nested 0700 directories under `root`, each named
/// [`deep_level_name`], with a 0600 `leaf.txt` at the bottom. Created
/// relative to open handles, since the full path exceeds PATH_MAX. Returns
/// the path of the deepest directory.
pub fn create_deep_tree(root: &Path, levels: usize) -> io::Result<PathBuf> {
    use rustix::fs::{self as rfs, Mode, OFlags};

    let dir_flags = OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC;
    let name = deep_level_name();
    let mut fd = rfs::openat(rfs::CWD, root, dir_flags, Mode::empty())?;
    let mut deepest = root.to_path_buf();
    for _ in 0..levels {
        rfs::mkdirat(&fd, name.as_str(), Mode::RWXU)?;
        fd = rfs::openat(&fd, name.as_str(), dir_flags, Mode::empty())?;
        deepest.push(&name);
    }
    rfs::openat(
        &fd,
        "leaf.txt",
        OFlags::CREATE | OFlags::WRONLY | OFlags::CLOEXEC,
        Mode::RUSR | Mode::WUSR,
    )?;
    Ok(deepest)
}
