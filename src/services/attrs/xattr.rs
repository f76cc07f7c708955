//! Extended attribute storage through `rustix`.

use super::{AttributeStore, EntryRef};
use std::io;

/// Writes attributes onto the filesystem entry itself.
///
/// A directory's own entry is written through its open handle. Other
/// entries are reopened relative to their directory without following
/// symlinks, so a symlink swapped in after classification is refused and
/// its target is never touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct XattrStore;

#[cfg(any(target_os = "linux", target_os = "android", target_vendor = "apple"))]
impl AttributeStore for XattrStore {
    fn set_attribute(&mut self, entry: EntryRef<'_>, name: &str, value: &[u8]) -> io::Result<()> {
        use rustix::fs::{self as rfs, XattrFlags};

        match entry.dir {
            Some(dir) if entry.is_self() => {
                rfs::fsetxattr(dir, name, value, XattrFlags::empty()).map_err(io::Error::from)
            }
            Some(dir) => set_in_directory(dir, &entry, name, value),
            None => rfs::lsetxattr(entry.path, name, value, XattrFlags::empty())
                .map_err(io::Error::from),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
impl AttributeStore for XattrStore {
    fn set_attribute(&mut self, entry: EntryRef<'_>, name: &str, _value: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!(
                "extended attributes are not supported on this platform ({name} on {})",
                entry.path.display()
            ),
        ))
    }
}

/// `O_PATH` handle on the entry, then a write through its `/proc` link.
/// Needs no read or write access to the file beyond what `setxattr` checks.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_in_directory(
    dir: rustix::fd::BorrowedFd<'_>,
    entry: &EntryRef<'_>,
    name: &str,
    value: &[u8],
) -> io::Result<()> {
    use rustix::fd::AsRawFd;
    use rustix::fs::{self as rfs, FileType, Mode, OFlags, XattrFlags};

    let flags = OFlags::PATH | OFlags::NOFOLLOW | OFlags::CLOEXEC;
    let fd = rfs::openat(dir, entry.name, flags, Mode::empty()).map_err(io::Error::from)?;

    // O_PATH|O_NOFOLLOW opens a symlink itself; never write through one.
    let stat = rfs::fstat(&fd).map_err(io::Error::from)?;
    #[allow(clippy::useless_conversion, clippy::unnecessary_cast)]
    let file_type = FileType::from_raw_mode(stat.st_mode as _);
    if file_type == FileType::Symlink {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "entry was replaced by a symbolic link",
        ));
    }

    let link = format!("/proc/self/fd/{}", fd.as_raw_fd());
    rfs::setxattr(link.as_str(), name, value, XattrFlags::empty()).map_err(io::Error::from)
}

/// No `O_PATH` here; open the entry itself, refusing symlinks.
#[cfg(target_vendor = "apple")]
fn set_in_directory(
    dir: rustix::fd::BorrowedFd<'_>,
    entry: &EntryRef<'_>,
    name: &str,
    value: &[u8],
) -> io::Result<()> {
    use rustix::fs::{self as rfs, Mode, OFlags, XattrFlags};

    let flags = OFlags::RDONLY | OFlags::NOFOLLOW | OFlags::NONBLOCK | OFlags::CLOEXEC;
    let fd = rfs::openat(dir, entry.name, flags, Mode::empty()).map_err(io::Error::from)?;
    rfs::fsetxattr(&fd, name, value, XattrFlags::empty()).map_err(io::Error::from)
}
