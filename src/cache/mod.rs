//! Persistent classification cache
//!
//! Remembers which package manager backend handles which image so that
//! repeated invocations do not probe the same image twice. The cache is
//! a single JSON file shared by every podpatch process on the host:
//!
//! ```json
//! {"ids": {"apt": ["<image-id>"], "others": []}, "outdated": []}
//! ```
//!
//! Consistency across concurrent invocations comes from the write path
//! alone: every write-back takes an exclusive advisory lock, re-reads
//! the file, unions it with the in-memory state and rewrites the merged
//! result. Loads outside the lock may be stale; the merge heals that.
//!
//! A cache that cannot find a writable location degrades to a
//! pass-through: lookups always miss and nothing is ever persisted.

pub mod file;
pub mod store;

pub use file::{load, load_from, replace_on_disk, write_back, CACHE_FILE_NAME};
pub use store::{ClassificationStore, UNCLASSIFIED};
