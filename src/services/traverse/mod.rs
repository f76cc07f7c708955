//! Depth-first tree walker.
//!
//! The walk keeps an explicit stack of open directory handles: every child
//! directory is opened with `openat` relative to its parent's handle and the
//! handle lives exactly as long as the recursion frame that walks it. Each
//! directory is annotated through its own `.` entry, regular files directly,
//! and everything else is reported and left alone.

use crate::models::{Diagnostic, DiagnosticKind, WalkReport};
use crate::services::attrs::{AttributeStore, MetadataQuery};
use crate::services::encode::Encoder;
use crate::services::position::Position;
use crate::{Result, WalkOptions};
use rustix::fd::{AsFd, OwnedFd};
use rustix::fs::{self as rfs, AtFlags, Dir, FileType, Mode, OFlags};
use std::ffi::{CStr, OsStr};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

const ROOT_FLAGS: OFlags = OFlags::RDONLY
    .union(OFlags::DIRECTORY)
    .union(OFlags::CLOEXEC);
// Children were classified from the listing; refuse a symlink swapped in since.
const CHILD_FLAGS: OFlags = ROOT_FLAGS.union(OFlags::NOFOLLOW);

/// Entry types the walker does not annotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    BlockDevice,
    CharacterDevice,
    Pipe,
    Symlink,
    Socket,
    Unknown,
}

impl SpecialKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SpecialKind::BlockDevice => "Block device",
            SpecialKind::CharacterDevice => "Character device",
            SpecialKind::Pipe => "Pipe",
            SpecialKind::Symlink => "Symlink",
            SpecialKind::Socket => "Socket",
            SpecialKind::Unknown => "Unknown type",
        }
    }
}

impl fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the walker does with a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    Special(SpecialKind),
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        match file_type {
            FileType::Directory => EntryKind::Directory,
            FileType::RegularFile => EntryKind::RegularFile,
            FileType::BlockDevice => EntryKind::Special(SpecialKind::BlockDevice),
            FileType::CharacterDevice => EntryKind::Special(SpecialKind::CharacterDevice),
            FileType::Fifo => EntryKind::Special(SpecialKind::Pipe),
            FileType::Symlink => EntryKind::Special(SpecialKind::Symlink),
            FileType::Socket => EntryKind::Special(SpecialKind::Socket),
            FileType::Unknown => EntryKind::Special(SpecialKind::Unknown),
        }
    }
}

/// Walks a tree and annotates it through an [`Encoder`].
pub struct Walker<Q, S> {
    encoder: Encoder<Q, S>,
    options: WalkOptions,
    report: WalkReport,
}

impl<Q: MetadataQuery, S: AttributeStore> Walker<Q, S> {
    #[must_use]
    pub fn new(query: Q, store: S, options: WalkOptions) -> Self {
        Self {
            encoder: Encoder::new(query, store),
            report: WalkReport::new(options.discard_diagnostics),
            options,
        }
    }

    #[must_use]
    pub fn report(&self) -> &WalkReport {
        &self.report
    }

    #[must_use]
    pub fn store(&self) -> &S {
        self.encoder.store()
    }

    pub fn into_report(self) -> WalkReport {
        self.report
    }

    pub fn into_parts(self) -> (S, WalkReport) {
        (self.encoder.into_store(), self.report)
    }

    /// Annotate the tree rooted at `root`.
    ///
    /// Failing to enter the root is logged like any other directory and
    /// leaves the report without encoded entries.
    ///
    /// # Errors
    /// Only [`crate::Error::ProtocolInvariantViolation`] stops the walk.
    pub fn walk(&mut self, root: &Path) -> Result<()> {
        self.report.root = root.display().to_string();
        log::debug!("Walking {}", root.display());

        let dir_fd = match rfs::openat(rfs::CWD, root, ROOT_FLAGS, Mode::empty()) {
            Ok(fd) => fd,
            Err(err) => {
                let at = Position::invocation().describe();
                self.report.record(Diagnostic::new(
                    DiagnosticKind::EnterFailed,
                    at.clone(),
                    Some(root.display().to_string()),
                    format!(
                        "Failed to enter {at}/{}: {}",
                        root.display(),
                        std::io::Error::from(err)
                    ),
                ));
                return Ok(());
            }
        };

        self.walk_directory(&Position::root(root), dir_fd)
    }

    fn walk_directory(&mut self, position: &Position, dir_fd: OwnedFd) -> Result<()> {
        let dir = match Dir::read_from(&dir_fd) {
            Ok(dir) => dir,
            Err(err) => {
                let at = position.describe();
                self.report.record(Diagnostic::new(
                    DiagnosticKind::OpenFailed,
                    at.clone(),
                    None,
                    format!("Failed to open {at}: {}", std::io::Error::from(err)),
                ));
                return Ok(());
            }
        };

        let mut processed = 0u64;
        for entry in dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let at = position.describe();
                    self.report.record(Diagnostic::new(
                        DiagnosticKind::ReadFailed,
                        at.clone(),
                        None,
                        format!(
                            "From {at} processed {processed} entries before failing to read: {}",
                            std::io::Error::from(err)
                        ),
                    ));
                    break;
                }
            };

            let raw_name = entry.file_name();
            if raw_name.to_bytes() == b".." {
                continue;
            }
            processed += 1;
            self.report.entries_processed = self.report.entries_processed.saturating_add(1);

            let name = OsStr::from_bytes(raw_name.to_bytes());
            match classify(&dir_fd, raw_name, entry.file_type()) {
                EntryKind::Directory if name == OsStr::new(".") => {
                    self.encoder
                        .encode_and_store(position, dir_fd.as_fd(), name, &mut self.report)?;
                }
                EntryKind::Directory => self.descend(position, &dir_fd, raw_name)?,
                EntryKind::RegularFile => {
                    self.encoder
                        .encode_and_store(position, dir_fd.as_fd(), name, &mut self.report)?;
                }
                EntryKind::Special(kind) => {
                    let at = position.describe();
                    let entry_name = name.to_string_lossy().into_owned();
                    let message = format!("Skipping file {at}/{entry_name} [{kind}]");
                    self.report.record(Diagnostic::new(
                        DiagnosticKind::Skipped,
                        at,
                        Some(entry_name),
                        message,
                    ));
                }
            }
        }

        log::trace!(
            "Leaving {} after {processed} entries",
            position.path().display()
        );
        Ok(())
    }

    fn descend(&mut self, position: &Position, parent_fd: &OwnedFd, raw_name: &CStr) -> Result<()> {
        let name = OsStr::from_bytes(raw_name.to_bytes());
        let child = position.child(name);

        if let Some(max_depth) = self.options.max_depth {
            if child.depth() > max_depth {
                let at = position.describe();
                let entry_name = name.to_string_lossy().into_owned();
                let message = format!(
                    "Not entering {at}/{entry_name}: depth limit of {max_depth} reached"
                );
                self.report.record(Diagnostic::new(
                    DiagnosticKind::DepthLimit,
                    at,
                    Some(entry_name),
                    message,
                ));
                return Ok(());
            }
        }

        let child_fd = match rfs::openat(parent_fd, raw_name, CHILD_FLAGS, Mode::empty()) {
            Ok(fd) => fd,
            Err(err) => {
                let at = position.describe();
                let entry_name = name.to_string_lossy().into_owned();
                let message = format!(
                    "Failed to enter {at}/{entry_name}: {}",
                    std::io::Error::from(err)
                );
                self.report.record(Diagnostic::new(
                    DiagnosticKind::EnterFailed,
                    at,
                    Some(entry_name),
                    message,
                ));
                return Ok(());
            }
        };

        log::debug!("Entering {}", child.path().display());
        self.walk_directory(&child, child_fd)
    }
}

/// Map a directory entry to what the walker does with it. Filesystems that
/// do not fill in the entry type get a no-follow `statat`.
fn classify(dir_fd: &OwnedFd, name: &CStr, listed: FileType) -> EntryKind {
    if listed != FileType::Unknown {
        return listed.into();
    }
    match rfs::statat(dir_fd, name, AtFlags::SYMLINK_NOFOLLOW) {
        #[allow(clippy::useless_conversion, clippy::unnecessary_cast)]
        Ok(stat) => FileType::from_raw_mode(stat.st_mode as _).into(),
        Err(err) => {
            log::debug!(
                "Could not determine type of {}: {}",
                name.to_string_lossy(),
                std::io::Error::from(err)
            );
            EntryKind::Special(SpecialKind::Unknown)
        }
    }
}
