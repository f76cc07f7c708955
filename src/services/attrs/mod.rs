//! Metadata query and attribute storage backends used by the encoder.

use std::ffi::OsStr;
use std::io;
use std::os::fd::BorrowedFd;
use std::path::Path;

/// Ownership and mode of one entry, as far as the filesystem reported them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    /// Full `st_mode`, type bits included.
    pub mode: Option<u32>,
}

impl EntryMetadata {
    #[must_use]
    pub fn new(uid: u32, gid: u32, mode: u32) -> Self {
        Self {
            uid: Some(uid),
            gid: Some(gid),
            mode: Some(mode),
        }
    }

    /// `(uid, gid, mode)` when all three fields were reported.
    #[must_use]
    pub fn complete(&self) -> Option<(u32, u32, u32)> {
        Some((self.uid?, self.gid?, self.mode?))
    }
}

/// One directory entry as the walker sees it.
///
/// System backends resolve `name` relative to `dir`, so neither the length
/// of `path` nor symlinks above the entry matter. `path` names the entry
/// for diagnostics and for backends that key by path. Without `dir`, `path`
/// is resolved against the working directory instead.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    pub dir: Option<BorrowedFd<'a>>,
    /// Name inside `dir`; `.` is the directory itself.
    pub name: &'a OsStr,
    pub path: &'a Path,
}

impl<'a> EntryRef<'a> {
    /// Entry `name` of the open directory `dir`.
    #[must_use]
    pub fn at(dir: BorrowedFd<'a>, name: &'a OsStr, path: &'a Path) -> Self {
        Self {
            dir: Some(dir),
            name,
            path,
        }
    }

    /// Entry reachable only through `path`.
    #[must_use]
    pub fn detached(path: &'a Path) -> Self {
        Self {
            dir: None,
            name: path.as_os_str(),
            path,
        }
    }

    #[must_use]
    pub fn is_self(&self) -> bool {
        self.dir.is_some() && self.name == OsStr::new(".")
    }
}

/// Source of ownership and mode for an entry.
pub trait MetadataQuery {
    /// Query the entry itself; symbolic links must not be followed.
    fn query(&self, entry: EntryRef<'_>) -> io::Result<EntryMetadata>;
}

/// Destination for encoded attributes.
pub trait AttributeStore {
    /// Store `value` under `name` on the entry, replacing any previous value.
    fn set_attribute(&mut self, entry: EntryRef<'_>, name: &str, value: &[u8]) -> io::Result<()>;
}

pub mod memory;
pub mod stat;
pub mod xattr;
