//! Attribute encoding and the per-entry encoder.
//!
//! Both records are written with their NUL terminator included in the
//! payload, which is what hostfs expects when it reads them back.

use std::fmt;
use std::result;
#[cfg(unix)]
use {
    crate::models::{Diagnostic, DiagnosticKind, WalkReport},
    crate::services::attrs::{AttributeStore, EntryRef, MetadataQuery},
    crate::services::position::Position,
    crate::{Error, Result},
    std::ffi::OsStr,
    std::os::fd::BorrowedFd,
};

/// Attribute holding `"<uid>,<gid>"`.
pub const CRED_ATTR: &str = "user.umlcred";
/// Attribute holding the 4-digit octal permission bits.
pub const MODE_ATTR: &str = "user.umlmode";

/// Encoded ownership size limit: 10 digits uid, 10 digits gid, ',' and NUL.
pub const OWNERSHIP_BOUND: usize = 22;
/// Number of octal digits in a mode record.
pub const MODE_DIGITS: usize = 4;

const FILE_TYPE_MASK: u32 = 0o170_000;
const PERMISSION_MASK: u32 = 0o7777;

/// An encoded value did not fit its fixed bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOverflow {
    detail: String,
}

impl fmt::Display for RecordOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// `user.umlcred` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRecord {
    bytes: Vec<u8>,
}

impl OwnershipRecord {
    /// Encode an owner/group pair.
    ///
    /// Ids are taken as `u64` so that a platform with ids wider than 32 bits
    /// is caught here instead of producing a value hostfs cannot parse.
    ///
    /// # Errors
    /// Returns [`RecordOverflow`] if the text would reach [`OWNERSHIP_BOUND`]
    /// bytes.
    pub fn encode(
        uid: impl Into<u64>,
        gid: impl Into<u64>,
    ) -> result::Result<Self, RecordOverflow> {
        let text = format!("{},{}", uid.into(), gid.into());
        if text.len() >= OWNERSHIP_BOUND {
            return Err(RecordOverflow {
                detail: format!(
                    "got an unexpected size of umlcred attribute ({} > {OWNERSHIP_BOUND})",
                    text.len() + 1
                ),
            });
        }
        let mut bytes = text.into_bytes();
        bytes.push(0);
        Ok(Self { bytes })
    }

    /// Payload including the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload text without the terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        text_of(&self.bytes)
    }
}

/// `user.umlmode` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRecord {
    bytes: [u8; MODE_DIGITS + 1],
}

impl ModeRecord {
    /// Encode the permission bits of `mode`; file type bits are ignored.
    ///
    /// # Errors
    /// Returns [`RecordOverflow`] if the permission bits need more than
    /// [`MODE_DIGITS`] octal digits.
    pub fn encode(mode: u32) -> result::Result<Self, RecordOverflow> {
        let permissions = mode & !FILE_TYPE_MASK;
        if permissions > PERMISSION_MASK {
            let digits = format!("{permissions:o}").len();
            return Err(RecordOverflow {
                detail: format!(
                    "got permissions in mode represented as more than {MODE_DIGITS} octal digits (got {digits})"
                ),
            });
        }

        let mut bytes = [0u8; MODE_DIGITS + 1];
        bytes[..MODE_DIGITS].copy_from_slice(format!("{permissions:04o}").as_bytes());
        Ok(Self { bytes })
    }

    /// Payload including the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload text without the terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        text_of(&self.bytes)
    }
}

fn text_of(bytes: &[u8]) -> &str {
    let body = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    // Only ever built from ASCII digits and ','.
    std::str::from_utf8(body).unwrap_or_default()
}

/// Queries an entry's metadata and stores it as the two UML attributes.
#[cfg(unix)]
pub struct Encoder<Q, S> {
    query: Q,
    store: S,
}

#[cfg(unix)]
impl<Q: MetadataQuery, S: AttributeStore> Encoder<Q, S> {
    #[must_use]
    pub fn new(query: Q, store: S) -> Self {
        Self { query, store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Annotate the entry `name` of the directory open as `dir` at
    /// `position`. Both backends resolve `name` through `dir`; the
    /// position only names the entry.
    ///
    /// Per-entry failures are recorded in `report`, never returned.
    ///
    /// # Errors
    /// Returns [`Error::ProtocolInvariantViolation`] when a record overflows
    /// its bound.
    pub fn encode_and_store(
        &mut self,
        position: &Position,
        dir: BorrowedFd<'_>,
        name: &OsStr,
        report: &mut WalkReport,
    ) -> Result<()> {
        let target = position.entry_path(name);
        let entry_ref = EntryRef::at(dir, name, &target);
        let entry = name.to_string_lossy().into_owned();

        let metadata = match self.query.query(entry_ref) {
            Ok(metadata) => metadata,
            Err(err) => {
                let at = position.describe();
                report.record(Diagnostic::new(
                    DiagnosticKind::StatFailed,
                    at.clone(),
                    Some(entry.clone()),
                    format!("Failed to stat {at}/{entry}: {err}"),
                ));
                return Ok(());
            }
        };

        let Some((uid, gid, mode)) = metadata.complete() else {
            let at = position.describe();
            report.record(Diagnostic::new(
                DiagnosticKind::PartialMetadata,
                at.clone(),
                Some(entry.clone()),
                format!(
                    "Failed to stat {at}/{entry}: Filesystem didn't return full UID,GID,mode info"
                ),
            ));
            return Ok(());
        };

        let violation = |overflow: RecordOverflow| Error::ProtocolInvariantViolation {
            path: format!("{}/{entry}", position.describe()),
            detail: overflow.to_string(),
        };
        let cred = OwnershipRecord::encode(uid, gid).map_err(violation)?;
        let mode = ModeRecord::encode(mode).map_err(violation)?;

        for (attr, value) in [(CRED_ATTR, cred.as_bytes()), (MODE_ATTR, mode.as_bytes())] {
            if let Err(err) = self.store.set_attribute(entry_ref, attr, value) {
                let at = position.describe();
                report.record(Diagnostic::new(
                    DiagnosticKind::AttributeWriteFailed,
                    at.clone(),
                    Some(entry.clone()),
                    format!("{attr} setxattr failed on {at}/{entry}: {err}"),
                ));
                return Ok(());
            }
        }

        log::trace!(
            "Encoded {}: {CRED_ATTR}={} {MODE_ATTR}={}",
            target.display(),
            cred.as_str(),
            mode.as_str()
        );
        report.entries_encoded = report.entries_encoded.saturating_add(1);
        Ok(())
    }
}
