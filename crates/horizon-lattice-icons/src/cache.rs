//! Directory listing cache.
//!
//! Icon lookups probe many theme subdirectories for a handful of candidate
//! filenames. Listing each directory once and keeping the filename set around
//! turns those probes into hash lookups. A cached listing is trusted for one
//! poll interval; after that the directory is `stat`ed and only re-listed if
//! its modification time moved forward.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, trace, warn};

use crate::config::DEFAULT_POLL_INTERVAL;

/// Filenames found in one directory.
pub type Listing = Arc<HashSet<String>>;

#[derive(Debug)]
struct CacheEntry {
    files: Listing,
    /// Last time the directory was checked for changes
    polled_at: Instant,
    /// Directory mtime when `files` was read
    mtime: SystemTime,
}

/// Cache of directory listings keyed by directory path.
///
/// Entries live until [`reset`](Self::reset) or
/// [`invalidate`](Self::invalidate); there is no eviction. Missing paths are
/// never cached, so a directory that appears later is picked up on the next
/// access.
#[derive(Debug)]
pub struct DirectoryCache {
    entries: HashMap<PathBuf, CacheEntry>,
    poll_interval: Duration,
    empty: Listing,
    /// Number of real directory scans performed
    list_count: u64,
}

impl DirectoryCache {
    /// Create a cache with the default 5 second poll interval.
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create a cache with a custom poll interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            poll_interval,
            empty: Arc::new(HashSet::new()),
            list_count: 0,
        }
    }

    /// Poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Filenames in `dir`, as of now.
    pub fn listing(&mut self, dir: &Path) -> Listing {
        self.listing_at(dir, Instant::now())
    }

    /// Filenames in `dir`, treating `now` as the current time.
    ///
    /// The directory is re-listed when it has never been listed, or when at
    /// least one poll interval has passed since the last check and its mtime
    /// advanced. Nonexistent paths, non-directories and unreadable
    /// directories yield an empty listing.
    pub fn listing_at(&mut self, dir: &Path, now: Instant) -> Listing {
        let cached_mtime = match self.entries.get(dir) {
            Some(entry) if now.saturating_duration_since(entry.polled_at) < self.poll_interval => {
                trace!(target: "horizon_lattice_icons::cache", "Listing hit: {}", dir.display());
                return Arc::clone(&entry.files);
            }
            Some(entry) => Some(entry.mtime),
            None => None,
        };

        let mtime = match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            _ => {
                if self.entries.remove(dir).is_some() {
                    debug!(
                        target: "horizon_lattice_icons::cache",
                        "Directory disappeared: {}", dir.display()
                    );
                }
                return Arc::clone(&self.empty);
            }
        };

        if let Some(previous) = cached_mtime
            && mtime <= previous
            && let Some(entry) = self.entries.get_mut(dir)
        {
            entry.polled_at = now;
            return Arc::clone(&entry.files);
        }

        match read_file_names(dir) {
            Ok(files) => {
                self.list_count += 1;
                debug!(
                    target: "horizon_lattice_icons::cache",
                    "Listed {} ({} entries)", dir.display(), files.len()
                );
                let files = Arc::new(files);
                self.entries.insert(
                    dir.to_path_buf(),
                    CacheEntry {
                        files: Arc::clone(&files),
                        polled_at: now,
                        mtime,
                    },
                );
                files
            }
            Err(e) => {
                warn!(
                    target: "horizon_lattice_icons::cache",
                    "Failed to list {}: {}", dir.display(), e
                );
                self.entries.remove(dir);
                Arc::clone(&self.empty)
            }
        }
    }

    /// Drop the cached listing of one directory.
    pub fn invalidate(&mut self, dir: &Path) {
        self.entries.remove(dir);
    }

    /// Drop every cached listing.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Returns true if `dir` has a cached listing.
    pub fn contains_path(&self, dir: &Path) -> bool {
        self.entries.contains_key(dir)
    }

    /// Number of cached directories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of directory scans performed since creation.
    pub fn list_count(&self) -> u64 {
        self.list_count
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file_names(dir: &Path) -> io::Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        // Icon names are UTF-8; anything else can never be requested
        if let Ok(name) = entry?.file_name().into_string() {
            names.insert(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    /// Push a directory's mtime forward so changes are visible regardless of
    /// filesystem timestamp granularity.
    fn bump_mtime(dir: &Path) {
        let later = SystemTime::now() + Duration::from_secs(60);
        File::open(dir).unwrap().set_modified(later).unwrap();
    }

    #[test]
    fn test_lists_directory() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.png"));
        touch(&tmp.path().join("b.svg"));

        let mut cache = DirectoryCache::new();
        let files = cache.listing(tmp.path());

        assert_eq!(files.len(), 2);
        assert!(files.contains("a.png"));
        assert!(cache.contains_path(tmp.path()));
        assert_eq!(cache.list_count(), 1);
    }

    #[test]
    fn test_missing_directory_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let file = tmp.path().join("file.png");
        touch(&file);

        let mut cache = DirectoryCache::new();
        assert!(cache.listing(&missing).is_empty());
        assert!(cache.listing(&file).is_empty());
        assert!(cache.is_empty());

        // Created later: seen on the very next access
        fs::create_dir(&missing).unwrap();
        touch(&missing.join("x.png"));
        assert!(cache.listing(&missing).contains("x.png"));
    }

    #[test]
    fn test_reuses_listing_within_interval() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("48x48");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("foo.png"));

        let mut cache = DirectoryCache::new();
        let start = Instant::now();
        assert!(cache.listing_at(&dir, start).contains("foo.png"));

        // Only a fresh poll could notice the directory is gone
        fs::remove_dir_all(&dir).unwrap();
        let again = cache.listing_at(&dir, start + Duration::from_secs(1));
        assert!(again.contains("foo.png"));
        assert_eq!(cache.list_count(), 1);

        // Once the interval has passed the removal is observed
        let later = cache.listing_at(&dir, start + Duration::from_secs(5));
        assert!(later.is_empty());
        assert!(!cache.contains_path(&dir));
    }

    #[test]
    fn test_relists_after_interval_when_mtime_advances() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        touch(&dir.join("old.png"));

        let mut cache = DirectoryCache::new();
        let start = Instant::now();
        cache.listing_at(dir, start);

        touch(&dir.join("new.png"));
        bump_mtime(dir);

        // Within the interval the new file stays invisible
        assert!(!cache.listing_at(dir, start + Duration::from_secs(4)).contains("new.png"));

        let files = cache.listing_at(dir, start + Duration::from_secs(5));
        assert!(files.contains("new.png"));
        assert_eq!(cache.list_count(), 2);
    }

    #[test]
    fn test_no_relist_when_mtime_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.png"));

        let mut cache = DirectoryCache::new();
        let start = Instant::now();
        cache.listing_at(tmp.path(), start);
        cache.listing_at(tmp.path(), start + Duration::from_secs(10));
        cache.listing_at(tmp.path(), start + Duration::from_secs(20));

        assert_eq!(cache.list_count(), 1);
    }

    #[test]
    fn test_invalidate_and_reset() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = DirectoryCache::with_poll_interval(Duration::from_secs(60));
        cache.listing(tmp.path());
        assert_eq!(cache.len(), 1);

        cache.invalidate(tmp.path());
        assert!(cache.is_empty());

        cache.listing(tmp.path());
        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.list_count(), 2);
    }
}
