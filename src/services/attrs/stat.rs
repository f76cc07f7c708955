//! Ownership and mode queries that never follow symbolic links.

use super::{EntryMetadata, EntryRef, MetadataQuery};
use rustix::fd::BorrowedFd;
use rustix::fs::{self as rfs, AtFlags};
use std::ffi::OsStr;
use std::io;

/// Queries the running system: `statx` on Linux, `fstatat` elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMetadata;

/// Directory and name to resolve `entry` with.
fn lookup<'a>(entry: &EntryRef<'a>) -> (BorrowedFd<'a>, &'a OsStr) {
    match entry.dir {
        Some(dir) => (dir, entry.name),
        None => (rfs::CWD, entry.path.as_os_str()),
    }
}

impl MetadataQuery for SystemMetadata {
    #[cfg(target_os = "linux")]
    fn query(&self, entry: EntryRef<'_>) -> io::Result<EntryMetadata> {
        use rustix::fs::StatxFlags;

        let (dir, name) = lookup(&entry);
        let wanted = StatxFlags::UID | StatxFlags::GID | StatxFlags::MODE;
        let stx =
            rfs::statx(dir, name, AtFlags::SYMLINK_NOFOLLOW, wanted).map_err(io::Error::from)?;

        // statx may leave fields out, e.g. on some network filesystems.
        let reported = |flag: StatxFlags| stx.stx_mask & flag.bits() != 0;
        Ok(EntryMetadata {
            uid: reported(StatxFlags::UID).then_some(stx.stx_uid),
            gid: reported(StatxFlags::GID).then_some(stx.stx_gid),
            mode: reported(StatxFlags::MODE).then_some(u32::from(stx.stx_mode)),
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn query(&self, entry: EntryRef<'_>) -> io::Result<EntryMetadata> {
        let (dir, name) = lookup(&entry);
        let stat = rfs::statat(dir, name, AtFlags::SYMLINK_NOFOLLOW).map_err(io::Error::from)?;
        #[allow(clippy::useless_conversion)]
        let mode = u32::from(stat.st_mode);
        Ok(EntryMetadata::new(stat.st_uid, stat.st_gid, mode))
    }
}
