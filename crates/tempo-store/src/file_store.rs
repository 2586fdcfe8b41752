use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use tempo_core::{Record, RecordId};

use crate::error::Result;

/// How long a keyed read snapshot stays valid.
const CACHE_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// On-disk shape: the whole record set of one type, as one MessagePack blob.
#[derive(Debug, Serialize, Deserialize)]
struct Container<T> {
    items: Vec<T>,
}

/// Generic whole-file store for one record type.
///
/// The read path may serve a cached snapshot when the caller supplies a cache
/// key; the write path always bypasses the cache, applies one mutation to the
/// freshly loaded set, rewrites the file, and drops every cached snapshot.
pub struct FileStore<T> {
    path: PathBuf,
    cache: Mutex<HashMap<String, (Instant, Arc<Vec<T>>)>>,
}

impl<T> FileStore<T>
where
    T: Record + Serialize + DeserializeOwned + Clone,
{
    /// Open (creating if needed) the container at `path`.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(&path, [])?;
        }
        Ok(Self {
            path,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn load_from_disk(&self) -> Vec<T> {
        match fs::read(&self.path) {
            Ok(raw) if raw.is_empty() => Vec::new(),
            Ok(raw) => match rmp_serde::from_slice::<Container<T>>(&raw) {
                Ok(container) => container.items,
                Err(e) => {
                    error!(path = %self.path.display(), "container decode failed: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                error!(path = %self.path.display(), "container read failed: {e}");
                Vec::new()
            }
        }
    }

    fn save_to_disk(&self, items: &[T]) -> Result<()> {
        let container = Container {
            items: items.to_vec(),
        };
        let raw = rmp_serde::to_vec(&container)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Load the set, serving a cached snapshot when `cache_key` matches a
    /// fresh entry. `None` always hits the disk.
    fn entities(&self, cache_key: Option<&str>) -> Arc<Vec<T>> {
        if let Some(key) = cache_key {
            let mut cache = self.cache.lock().unwrap();
            if let Some((stamp, data)) = cache.get(key) {
                if stamp.elapsed() < CACHE_LIFETIME {
                    debug!(key, "store cache hit");
                    return Arc::clone(data);
                }
            }
            let data = Arc::new(self.load_from_disk());
            cache.insert(key.to_string(), (Instant::now(), Arc::clone(&data)));
            // Sweep entries past twice the lifetime while we hold the lock.
            cache.retain(|_, (stamp, _)| stamp.elapsed() < CACHE_LIFETIME * 2);
            data
        } else {
            Arc::new(self.load_from_disk())
        }
    }

    fn invalidate_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    // --- read path ---------------------------------------------------------

    pub fn get_all(&self, cache_key: Option<&str>) -> Vec<T> {
        self.entities(cache_key).as_ref().clone()
    }

    pub fn get_by_id(&self, id: RecordId, cache_key: Option<&str>) -> Option<T> {
        self.entities(cache_key)
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    pub fn find_many(&self, predicate: impl Fn(&T) -> bool, cache_key: Option<&str>) -> Vec<T> {
        self.entities(cache_key)
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    pub fn count(&self, cache_key: Option<&str>) -> usize {
        self.entities(cache_key).len()
    }

    pub fn exists(&self, predicate: impl Fn(&T) -> bool, cache_key: Option<&str>) -> bool {
        self.entities(cache_key).iter().any(|e| predicate(e))
    }

    // --- write path --------------------------------------------------------

    pub fn insert(&self, entity: T) -> Result<()> {
        self.invalidate_cache();
        let mut entities = self.load_from_disk();
        entities.push(entity);
        self.save_to_disk(&entities)
    }

    /// Replace the record with the same id. Returns `false` (without
    /// touching the file) when no such record exists.
    pub fn update(&self, entity: T) -> Result<bool> {
        self.invalidate_cache();
        let mut entities = self.load_from_disk();
        let id = entity.id();
        match entities.iter_mut().find(|e| e.id() == id) {
            Some(slot) => {
                *slot = entity;
                self.save_to_disk(&entities)?;
                Ok(true)
            }
            None => {
                warn!(%id, "update target not found");
                Ok(false)
            }
        }
    }

    pub fn remove(&self, id: RecordId) -> Result<bool> {
        self.invalidate_cache();
        let mut entities = self.load_from_disk();
        let before = entities.len();
        entities.retain(|e| e.id() != id);
        if entities.len() == before {
            warn!(%id, "remove target not found");
            return Ok(false);
        }
        self.save_to_disk(&entities)?;
        Ok(true)
    }

    /// Remove every listed id in one rewrite. Returns how many were dropped.
    pub fn remove_many(&self, ids: &[RecordId]) -> Result<usize> {
        self.invalidate_cache();
        let mut entities = self.load_from_disk();
        let before = entities.len();
        entities.retain(|e| !ids.contains(&e.id()));
        let dropped = before - entities.len();
        if dropped > 0 {
            self.save_to_disk(&entities)?;
        }
        Ok(dropped)
    }

    /// Swap the entire set — the daily renovation path.
    pub fn replace_all(&self, entities: Vec<T>) -> Result<()> {
        self.invalidate_cache();
        self.save_to_disk(&entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use tempo_core::Task;

    fn store_in(dir: &tempfile::TempDir) -> FileStore<Task> {
        FileStore::open(dir.path().join("tasks.bin")).unwrap()
    }

    fn task(title: &str) -> Task {
        Task::new(title, Utc::now() + ChronoDuration::hours(1))
    }

    #[test]
    fn insert_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let t = task("write tests");
        store.insert(t.clone()).unwrap();

        let all = store.get_all(None);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, t.id);
        assert_eq!(store.get_by_id(t.id, None).unwrap().title, "write tests");
    }

    #[test]
    fn update_and_remove_report_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut t = task("draft");
        store.insert(t.clone()).unwrap();

        t.title = "final".into();
        assert!(store.update(t.clone()).unwrap());
        assert_eq!(store.get_by_id(t.id, None).unwrap().title, "final");

        assert!(store.remove(t.id).unwrap());
        assert!(!store.remove(t.id).unwrap());
        assert!(!store.update(t).unwrap());
    }

    #[test]
    fn remove_many_drops_only_listed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let keep = task("keep");
        let drop_a = task("a");
        let drop_b = task("b");
        for t in [&keep, &drop_a, &drop_b] {
            store.insert((*t).clone()).unwrap();
        }

        let dropped = store.remove_many(&[drop_a.id, drop_b.id]).unwrap();
        assert_eq!(dropped, 2);
        let all = store.get_all(None);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep.id);
    }

    #[test]
    fn keyed_read_serves_snapshot_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.insert(task("first")).unwrap();

        assert_eq!(store.get_all(Some("view")).len(), 1);

        // Mutate the file behind the cache's back — the snapshot must win.
        let shadow = store_in(&dir);
        shadow.insert(task("second")).unwrap();
        assert_eq!(store.get_all(Some("view")).len(), 1);
        // Uncached reads see the current file.
        assert_eq!(store.get_all(None).len(), 2);

        // Any write through this handle drops every snapshot.
        store.insert(task("third")).unwrap();
        assert_eq!(store.get_all(Some("view")).len(), 3);
    }

    #[test]
    fn corrupted_container_degrades_to_empty_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.bin");
        let store: FileStore<Task> = FileStore::open(path.clone()).unwrap();
        store.insert(task("doomed")).unwrap();

        // Simulate a crash mid-rewrite: garbage where the container was.
        std::fs::write(&path, b"\xff\xff\xff not msgpack").unwrap();
        assert!(store.get_all(None).is_empty());

        // The store stays writable afterwards — the next rewrite wins.
        store.insert(task("recovered")).unwrap();
        assert_eq!(store.get_all(None).len(), 1);
    }

    #[test]
    fn find_many_filters_with_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut important = task("deadline");
        important.important = true;
        store.insert(important.clone()).unwrap();
        store.insert(task("someday")).unwrap();

        let found = store.find_many(|t| t.important, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, important.id);
        assert!(store.exists(|t| t.title == "someday", None));
        assert_eq!(store.count(None), 2);
    }
}
