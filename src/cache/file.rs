//! Cache file location, locking and the read-merge-write protocol
//!
//! Every failure in here is absorbed: a broken cache must never abort
//! the operation that tried to use it. The worst case is a cold cache
//! and one extra probe per image.

use crate::cache::store::ClassificationStore;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the cache file inside each candidate directory.
pub const CACHE_FILE_NAME: &str = "podpatch.json";

/// Exclusive advisory lock on the cache file, released on drop.
///
/// `flock` is advisory only and not crash-safe: a holder that hangs
/// (rather than dies) blocks every other invocation until it lets go.
struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    /// Block until an exclusive lock is acquired.
    fn exclusive(file: &'a File) -> std::io::Result<Self> {
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(Self { file })
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

/// Directories tried for the cache file, in order: the user cache
/// directory, then the shared temporary directory.
fn candidate_dirs() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = dirs::cache_dir().into_iter().collect();
    candidates.push(PathBuf::from("/tmp"));
    candidates
}

/// Open (or create) the cache file in the first writable candidate
/// directory. `None` means caching is disabled for this invocation.
fn open_cache_file(candidates: &[PathBuf]) -> Option<(File, PathBuf)> {
    for dir in candidates {
        if fs::create_dir_all(dir).is_err() {
            continue;
        }
        let path = dir.join(CACHE_FILE_NAME);
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o666)
            .open(&path)
        {
            Ok(file) => {
                debug!("using cache file {}", path.display());
                return Some((file, path));
            }
            Err(e) => debug!("cache candidate {} rejected: {}", path.display(), e),
        }
    }
    None
}

/// Decode the cache file contents. An empty or malformed file degrades
/// to an empty store so that later write-backs still persist.
fn decode(mut file: &File, path: &Path) -> ClassificationStore {
    let mut raw = String::new();
    if let Err(e) = file.read_to_string(&mut raw) {
        warn!("cannot read the cache file {}: {}", path.display(), e);
        return ClassificationStore::empty(path.to_path_buf());
    }
    if raw.trim().is_empty() {
        return ClassificationStore::empty(path.to_path_buf());
    }
    match serde_json::from_str::<ClassificationStore>(&raw) {
        Ok(store) => store.attach(path.to_path_buf()),
        Err(e) => {
            warn!("decoding of cache file {} failed: {}", path.display(), e);
            ClassificationStore::empty(path.to_path_buf())
        }
    }
}

/// Load the store from the default cache location.
pub fn load() -> ClassificationStore {
    load_from(&candidate_dirs())
}

/// Load the store, trying the given directories in order. Returns a
/// detached (pass-through) store when no candidate is usable.
pub fn load_from(candidates: &[PathBuf]) -> ClassificationStore {
    match open_cache_file(candidates) {
        Some((file, path)) => decode(&file, &path),
        None => {
            warn!("could not find a writable location for the cache; caching disabled");
            ClassificationStore::detached()
        }
    }
}

/// Persist the store, merged with whatever is currently on disk.
///
/// Re-reading under the lock is what makes concurrent invocations safe:
/// the snapshot taken at load time may be stale, so trusting it here
/// would clobber updates committed since. After the call the in-memory
/// store equals the new file contents, so calling again is harmless.
pub fn write_back(store: &mut ClassificationStore) {
    persist(store, true);
}

/// Persist the store as-is, replacing the on-disk contents instead of
/// merging with them. Used by reset, which must truly empty the file.
pub fn replace_on_disk(store: &mut ClassificationStore) {
    persist(store, false);
}

fn persist(store: &mut ClassificationStore, merge: bool) {
    if !store.is_valid() {
        // The user was already warned at load time.
        return;
    }

    let file = match OpenOptions::new().read(true).write(true).open(store.path()) {
        Ok(file) => file,
        Err(e) => {
            warn!("cannot write to the cache file {}: {}", store.path().display(), e);
            return;
        }
    };
    let _lock = match FileLock::exclusive(&file) {
        Ok(lock) => lock,
        Err(e) => {
            warn!("cannot lock the cache file {}: {}", store.path().display(), e);
            return;
        }
    };

    if merge {
        let on_disk = decode(&file, store.path());
        store.merge(&on_disk);
    }

    if let Err(e) = rewrite(&file, store) {
        warn!("cannot write to the cache file {}: {}", store.path().display(), e);
    }
}

fn rewrite(mut file: &File, store: &ClassificationStore) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    serde_json::to_writer(file, store).map_err(std::io::Error::from)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::UNCLASSIFIED;
    use tempfile::TempDir;

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn sorted(value: &serde_json::Value) -> Vec<String> {
        let mut v: Vec<String> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e.as_str().unwrap().to_string())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn load_creates_the_file_in_the_first_writable_dir() {
        let dir = TempDir::new().unwrap();
        let store = load_from(&[dir.path().to_path_buf()]);

        assert!(store.is_valid());
        assert_eq!(store.path(), dir.path().join(CACHE_FILE_NAME));
        assert!(store.path().exists());
    }

    #[test]
    fn load_falls_through_unwritable_candidates() {
        let dir = TempDir::new().unwrap();
        let store = load_from(&[PathBuf::from("/proc/nope"), dir.path().to_path_buf()]);

        assert!(store.is_valid());
        assert_eq!(store.path(), dir.path().join(CACHE_FILE_NAME));
    }

    #[test]
    fn no_usable_location_means_detached_store() {
        let store = load_from(&[PathBuf::from("/proc/nope")]);
        assert!(!store.is_valid());
    }

    #[test]
    fn detached_store_never_persists() {
        let mut store = load_from(&[PathBuf::from("/proc/nope")]);
        store.record("apt", "img1");
        write_back(&mut store);
        // Nothing to assert on disk: there is no disk. The call must
        // simply not panic and the store must stay detached.
        assert!(!store.is_valid());
    }

    #[test]
    fn malformed_file_degrades_to_empty_valid_store() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CACHE_FILE_NAME), "not json {").unwrap();

        let mut store = load_from(&[dir.path().to_path_buf()]);
        assert!(store.is_valid());
        assert_eq!(store.bucket_of("anything"), None);

        // A later write-back still persists.
        store.record("apt", "img1");
        write_back(&mut store);
        let json = read_json(store.path());
        assert_eq!(sorted(&json["ids"]["apt"]), ["img1"]);
    }

    #[test]
    fn write_back_merges_with_concurrent_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        fs::write(&path, r#"{"ids":{"zypper":["a"]},"outdated":[]}"#).unwrap();

        let mut store = load_from(&[dir.path().to_path_buf()]);

        // Another invocation commits while we hold a stale snapshot.
        fs::write(
            &path,
            r#"{"ids":{"zypper":["a"],"dnf":["b"]},"outdated":["a"]}"#,
        )
        .unwrap();

        store.record("zypper", "c");
        write_back(&mut store);

        let json = read_json(&path);
        assert_eq!(sorted(&json["ids"]["zypper"]), ["a", "c"]);
        assert_eq!(sorted(&json["ids"]["dnf"]), ["b"]);
        assert_eq!(sorted(&json["outdated"]), ["a"]);
    }

    #[test]
    fn write_back_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = load_from(&[dir.path().to_path_buf()]);
        store.record("apt", "img1");
        store.record_outdated("img1");

        write_back(&mut store);
        let first = read_json(store.path());
        write_back(&mut store);
        let second = read_json(store.path());

        assert_eq!(first, second);
        assert_eq!(sorted(&second["ids"]["apt"]), ["img1"]);
        assert_eq!(sorted(&second["outdated"]), ["img1"]);
    }

    #[test]
    fn independent_deltas_union_regardless_of_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        fs::write(&path, r#"{"ids":{"apt":["x"]},"outdated":[]}"#).unwrap();

        let mut one = load_from(&[dir.path().to_path_buf()]);
        let mut two = load_from(&[dir.path().to_path_buf()]);

        one.record("apt", "y");
        two.record("apt", "z");

        write_back(&mut two);
        write_back(&mut one);

        let json = read_json(&path);
        assert_eq!(sorted(&json["ids"]["apt"]), ["x", "y", "z"]);
    }

    #[test]
    fn shorter_on_disk_state_never_truncates_into_garbage() {
        // The merged store can be smaller than what a previous process
        // wrote; set_len(0) before encoding must leave no trailing junk.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        let long = format!(
            r#"{{"ids":{{"apt":["{}"]}},"outdated":[]}}"#,
            "a".repeat(512)
        );
        fs::write(&path, long).unwrap();

        let mut store = load_from(&[dir.path().to_path_buf()]);
        store.clear();
        replace_on_disk(&mut store);

        let json = read_json(&path);
        assert!(json["ids"].as_object().unwrap().is_empty());
    }

    #[test]
    fn replace_on_disk_empties_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        fs::write(
            &path,
            r#"{"ids":{"apt":["1"],"others":["2"]},"outdated":["1"]}"#,
        )
        .unwrap();

        let mut store = load_from(&[dir.path().to_path_buf()]);
        store.clear();
        replace_on_disk(&mut store);

        let json = read_json(&path);
        assert!(json["ids"].as_object().unwrap().is_empty());
        assert!(json["outdated"].as_array().unwrap().is_empty());
    }

    #[test]
    fn round_trip_through_the_file() {
        let dir = TempDir::new().unwrap();
        let mut store = load_from(&[dir.path().to_path_buf()]);
        store.record("dnf", "1");
        store.record(UNCLASSIFIED, "2");
        store.record_outdated("3");
        write_back(&mut store);

        let reloaded = load_from(&[dir.path().to_path_buf()]);
        assert_eq!(reloaded.bucket("dnf"), ["1"]);
        assert_eq!(reloaded.bucket(UNCLASSIFIED), ["2"]);
        assert_eq!(reloaded.outdated(), ["3"]);
    }
}
