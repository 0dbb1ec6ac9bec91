//! Local strategy: one string-keyed JSON blob.
//!
//! # Invariants
//! - Every commit rewrites the full `{tasks, focusAreas}` snapshot.
//! - A missing blob loads as an empty planner.
//! - File writes go through a temp file and rename.

use super::{CommitOutcome, Mutation, PersistResult, PersistenceMode, PersistenceStrategy};
use crate::model::snapshot::PlannerSnapshot;
use log::debug;
use std::collections::HashMap;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Default key the planner blob is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "day-planner-tasks";

/// Durable string-keyed blob storage.
pub trait BlobStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStorage {
    dir: PathBuf,
}

impl FileBlobStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }
}

impl BlobStorage for FileBlobStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)
    }
}

/// In-process blob storage. Clones share the same blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStorage {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| io::Error::new(ErrorKind::Other, "memory blob storage lock poisoned"))
    }
}

impl BlobStorage for MemoryBlobStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Strategy that mirrors the full snapshot into one blob.
pub struct LocalStrategy<S: BlobStorage> {
    storage: S,
    key: String,
}

impl<S: BlobStorage> LocalStrategy<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn with_default_key(storage: S) -> Self {
        Self::new(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: BlobStorage> PersistenceStrategy for LocalStrategy<S> {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Local
    }

    fn load(&mut self) -> PersistResult<PlannerSnapshot> {
        match self.storage.read(&self.key)? {
            Some(raw) => Ok(PlannerSnapshot::from_local_blob(&raw)?),
            None => Ok(PlannerSnapshot::default()),
        }
    }

    fn commit(
        &mut self,
        _mutation: &Mutation,
        state: &PlannerSnapshot,
    ) -> PersistResult<CommitOutcome> {
        let blob = state.to_local_blob()?;
        self.storage.write(&self.key, &blob)?;
        debug!(
            "event=local_persist module=persist status=ok bytes={}",
            blob.len()
        );
        Ok(CommitOutcome::Persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobStorage, FileBlobStorage, LocalStrategy, MemoryBlobStorage};
    use crate::model::snapshot::PlannerSnapshot;
    use crate::model::task::Task;
    use crate::persist::{CommitOutcome, Mutation, PersistenceStrategy};

    #[test]
    fn file_storage_sanitizes_key() {
        let storage = FileBlobStorage::new("/tmp/planner");
        let path = storage.path_for("day planner/../tasks");
        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("day_planner____tasks.json"));
    }

    #[test]
    fn missing_blob_loads_empty() {
        let mut strategy = LocalStrategy::with_default_key(MemoryBlobStorage::new());
        let snapshot = strategy.load().expect("load should succeed");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn commit_rewrites_full_snapshot() {
        let storage = MemoryBlobStorage::new();
        let mut strategy = LocalStrategy::new(storage.clone(), "planner");
        let state = PlannerSnapshot::new(vec![Task::new(1, "Plan", "Work")], vec!["Work".to_string()]);

        let outcome = strategy
            .commit(&Mutation::ReorderTasks, &state)
            .expect("commit should succeed");
        assert_eq!(outcome, CommitOutcome::Persisted);

        let raw = storage
            .read("planner")
            .expect("read should succeed")
            .expect("blob should exist");
        assert_eq!(
            PlannerSnapshot::from_local_blob(&raw).expect("blob should decode"),
            state
        );
    }

    #[test]
    fn file_storage_round_trips_through_directory() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut storage = FileBlobStorage::new(dir.path().join("nested"));
        assert_eq!(storage.read("k").expect("read should succeed"), None);

        storage.write("k", "{}").expect("write should succeed");
        assert_eq!(
            storage.read("k").expect("read should succeed").as_deref(),
            Some("{}")
        );
    }
}
