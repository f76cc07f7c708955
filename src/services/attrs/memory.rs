//! In-memory attribute store, for dry runs and tests that must not depend on
//! the filesystem supporting `user.*` attributes. Keyed by the entry's path.

use super::{AttributeStore, EntryRef};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct MemoryStore {
    attributes: HashMap<PathBuf, HashMap<String, Vec<u8>>>,
    write_count: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw payload stored under `name` on `path`, terminator included.
    #[must_use]
    pub fn get(&self, path: &Path, name: &str) -> Option<&[u8]> {
        self.attributes
            .get(path)
            .and_then(|attrs| attrs.get(name))
            .map(Vec::as_slice)
    }

    /// Payload as text with the trailing NUL stripped.
    #[must_use]
    pub fn get_str(&self, path: &Path, name: &str) -> Option<&str> {
        let raw = self.get(path, name)?;
        std::str::from_utf8(raw.strip_suffix(&[0]).unwrap_or(raw)).ok()
    }

    /// Paths that carry at least one attribute.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.attributes.keys().map(PathBuf::as_path)
    }

    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

impl AttributeStore for MemoryStore {
    fn set_attribute(&mut self, entry: EntryRef<'_>, name: &str, value: &[u8]) -> io::Result<()> {
        self.write_count = self.write_count.saturating_add(1);
        self.attributes
            .entry(entry.path.to_path_buf())
            .or_default()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }
}
