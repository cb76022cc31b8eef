//! Memoized, immutable registry snapshots.
//!
//! Readers clone an `Arc<Registry>` out of a read lock and then work lock-free.
//! Loads and invalidation share one mutex, so a cache miss loads the backing
//! store exactly once and a swap is never observed half-done.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::blocking::BlockingIndex;
use crate::error::ReconError;
use crate::model::EntityRecord;

pub const DEFAULT_SOURCE: &str = "repd";

/// Backing store for registry records.
pub trait RegistryLoader: Send + Sync {
    /// Full record set, in store order.
    fn load(&self) -> Result<Vec<EntityRecord>, ReconError>;

    /// Whether the store can be found at all.
    fn exists(&self) -> bool;

    /// Number of records, for health reporting.
    fn count(&self) -> Result<usize, ReconError> {
        self.load().map(|records| records.len())
    }

    /// Short human-readable location (path, URL, "memory").
    fn describe(&self) -> String;
}

/// Fixed in-memory record list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    records: Vec<EntityRecord>,
}

impl InMemoryLoader {
    pub fn new(records: Vec<EntityRecord>) -> Self {
        Self { records }
    }
}

impl RegistryLoader for InMemoryLoader {
    fn load(&self) -> Result<Vec<EntityRecord>, ReconError> {
        Ok(self.records.clone())
    }

    fn exists(&self) -> bool {
        true
    }

    fn count(&self) -> Result<usize, ReconError> {
        Ok(self.records.len())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

/// One loaded registry: records plus their blocking index.
#[derive(Debug)]
pub struct Registry {
    source: String,
    records: Vec<EntityRecord>,
    index: BlockingIndex,
    loaded_at: DateTime<Utc>,
}

impl Registry {
    pub fn new(source: impl Into<String>, records: Vec<EntityRecord>) -> Self {
        let index = BlockingIndex::build(&records);
        Self {
            source: source.into(),
            records,
            index,
            loaded_at: Utc::now(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Blocked candidates for a normalised query, in registry order.
    pub fn candidates(&self, query_normalised: &str, min_candidates: usize) -> Vec<&EntityRecord> {
        self.index.candidates(query_normalised, &self.records, min_candidates)
    }
}

#[derive(Default)]
pub struct RegistryCache {
    loaders: HashMap<String, Arc<dyn RegistryLoader>>,
    snapshots: RwLock<HashMap<String, Arc<Registry>>>,
    load_lock: Mutex<()>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the loader behind `source`. Replaces any earlier registration.
    pub fn with_source(mut self, source: impl Into<String>, loader: Arc<dyn RegistryLoader>) -> Self {
        self.loaders.insert(source.into(), loader);
        self
    }

    /// Snapshot for `source`, loading it on first use.
    pub fn records(&self, source: &str) -> Result<Arc<Registry>, ReconError> {
        if let Some(snapshot) = self.snapshots.read().get(source) {
            return Ok(Arc::clone(snapshot));
        }

        let _guard = self.load_lock.lock();

        // Another caller may have loaded it while we waited.
        if let Some(snapshot) = self.snapshots.read().get(source) {
            return Ok(Arc::clone(snapshot));
        }

        let loader = self
            .loaders
            .get(source)
            .ok_or_else(|| ReconError::unavailable(format!("no registry source named '{source}'")))?;

        if !loader.exists() {
            return Err(ReconError::unavailable(format!("registry not found at {}", loader.describe())));
        }

        let records = loader.load().map_err(|e| match e {
            ReconError::RegistryUnavailable(_) => e,
            other => ReconError::unavailable(other.to_string()),
        })?;

        if records.is_empty() {
            return Err(ReconError::unavailable(format!("registry at {} is empty", loader.describe())));
        }

        let snapshot = Arc::new(Registry::new(source, records));
        tracing::info!(
            source = snapshot.source(),
            records = snapshot.len(),
            location = %loader.describe(),
            loaded_at = %snapshot.loaded_at().to_rfc3339(),
            "registry loaded"
        );

        self.snapshots.write().insert(source.to_string(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop every memoized snapshot. Readers holding an old `Arc` keep it.
    pub fn invalidate(&self) {
        let _guard = self.load_lock.lock();
        let dropped = {
            let mut snapshots = self.snapshots.write();
            let n = snapshots.len();
            snapshots.clear();
            n
        };
        tracing::info!(dropped, "registry cache invalidated");
    }

    pub fn is_loaded(&self, source: &str) -> bool {
        self.snapshots.read().contains_key(source)
    }
}

impl std::fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCache")
            .field("sources", &self.loaders.keys().collect::<Vec<_>>())
            .field("loaded", &self.snapshots.read().keys().cloned().collect::<Vec<_>>())
            .finish()
    }
}
