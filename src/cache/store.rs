//! In-memory cache contents and merge logic
//!
//! Pure data: no I/O happens here. Reading and writing the backing file
//! lives in [`crate::cache::file`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Reserved bucket for images no registered backend could claim.
pub const UNCLASSIFIED: &str = "others";

/// Cached classification data for one invocation.
///
/// `ids` groups image IDs by the backend that claimed them; images that
/// failed every probe land in the [`UNCLASSIFIED`] bucket so they are
/// never probed again. `outdated` holds the IDs of images that have
/// already been patched or updated through podpatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationStore {
    #[serde(default)]
    ids: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    outdated: Vec<String>,

    /// Path of the backing file, kept for write-back.
    #[serde(skip)]
    path: PathBuf,

    /// Whether this store is backed by a usable file. An invalid store
    /// never persists anything and every lookup misses.
    #[serde(skip)]
    valid: bool,
}

impl ClassificationStore {
    /// An empty store backed by the given file.
    pub(crate) fn empty(path: PathBuf) -> Self {
        Self {
            ids: BTreeMap::new(),
            outdated: Vec::new(),
            path,
            valid: true,
        }
    }

    /// A store with no backing file. Pass-through mode: lookups always
    /// miss and write-back is a no-op.
    pub(crate) fn detached() -> Self {
        Self {
            ids: BTreeMap::new(),
            outdated: Vec::new(),
            path: PathBuf::new(),
            valid: false,
        }
    }

    /// Attach location metadata after decoding file contents.
    pub(crate) fn attach(mut self, path: PathBuf) -> Self {
        self.path = path;
        self.valid = true;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The bucket the given image ID is recorded under, if any.
    pub fn bucket_of(&self, id: &str) -> Option<&str> {
        for (bucket, entries) in &self.ids {
            if entries.iter().any(|e| e == id) {
                return Some(bucket);
            }
        }
        None
    }

    /// Whether the given image ID has already been patched or updated.
    pub fn is_outdated(&self, id: &str) -> bool {
        self.outdated.iter().any(|e| e == id)
    }

    /// Image IDs recorded under the given bucket.
    pub fn bucket(&self, name: &str) -> &[String] {
        self.ids.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All recorded bucket names, including [`UNCLASSIFIED`] if present.
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    pub fn outdated(&self) -> &[String] {
        &self.outdated
    }

    /// Record an image ID under a bucket. Returns false if it was
    /// already there.
    pub(crate) fn record(&mut self, bucket: &str, id: &str) -> bool {
        let entries = self.ids.entry(bucket.to_string()).or_default();
        if entries.iter().any(|e| e == id) {
            return false;
        }
        entries.push(id.to_string());
        true
    }

    /// Record an image ID as already patched. Returns false if it was
    /// already there.
    pub(crate) fn record_outdated(&mut self, id: &str) -> bool {
        if self.is_outdated(id) {
            return false;
        }
        self.outdated.push(id.to_string());
        true
    }

    /// Union the freshly-read on-disk contents into this store and
    /// dedupe every list. Local entries keep their position; entries
    /// only present on disk are appended. The union makes write-back
    /// commutative: no interleaving of concurrent invocations can drop
    /// another process's additions.
    pub(crate) fn merge(&mut self, disk: &ClassificationStore) {
        for (bucket, entries) in &disk.ids {
            self.ids
                .entry(bucket.clone())
                .or_default()
                .extend(entries.iter().cloned());
        }
        for entries in self.ids.values_mut() {
            dedupe(entries);
        }
        self.outdated.extend(disk.outdated.iter().cloned());
        dedupe(&mut self.outdated);
    }

    /// Drop every classification and remediation record in memory.
    pub(crate) fn clear(&mut self) {
        self.ids.clear();
        self.outdated.clear();
    }
}

/// Remove duplicates, keeping the first occurrence of each entry.
fn dedupe(entries: &mut Vec<String>) {
    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.clone()));
}
