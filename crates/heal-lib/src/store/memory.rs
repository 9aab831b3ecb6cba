//! In-process document store
//!
//! Documents live in a concurrent map keyed by path. When a snapshot path
//! is configured the store loads it on open and rewrites it after every
//! write, using a temp file and rename so a crash never leaves a torn file.
//! A write whose snapshot cannot be saved is rolled back in memory too.

use super::{Document, DocumentPath, DocumentStore, StoreSettings, WriteBatch};
use crate::error::{HealError, Result};
use crate::health::{components, HealthRegistry};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// On-disk snapshot layout
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    project_id: String,
    documents: BTreeMap<String, Document>,
}

/// Document store held in memory
pub struct MemoryStore {
    project_id: String,
    documents: DashMap<String, Document>,
    snapshot_path: Option<PathBuf>,
    /// Serializes writes together with their snapshot rewrite
    write_lock: Mutex<()>,
    health: Option<HealthRegistry>,
}

impl MemoryStore {
    /// Create an empty, unpersisted store
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            documents: DashMap::new(),
            snapshot_path: None,
            write_lock: Mutex::new(()),
            health: None,
        }
    }

    /// Report snapshot write results to `registry`
    pub fn with_health(mut self, registry: HealthRegistry) -> Self {
        self.health = Some(registry);
        self
    }

    /// Open a store from resolved settings, loading the snapshot if present
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        let mut store = Self::new(settings.project_id.clone());
        store.snapshot_path = settings.snapshot_path.clone();

        if let Some(path) = &settings.snapshot_path {
            if path.exists() {
                let snapshot = load_snapshot(path)?;
                if snapshot.project_id != settings.project_id {
                    return Err(HealError::Storage(format!(
                        "snapshot {} belongs to project {}, expected {}",
                        path.display(),
                        snapshot.project_id,
                        settings.project_id
                    )));
                }
                for (key, doc) in snapshot.documents {
                    store.documents.insert(key, doc);
                }
            }
        }

        info!(
            project_id = %store.project_id,
            credentials = %settings.credentials.source,
            documents = store.documents.len(),
            persistent = store.snapshot_path.is_some(),
            "Opened document store"
        );
        Ok(store)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Apply `writes` and save the snapshot, restoring the previous
    /// documents if the snapshot cannot be written.
    async fn apply(&self, writes: Vec<(String, Document)>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut previous = Vec::with_capacity(writes.len());
        for (key, document) in writes {
            let old = self.documents.insert(key.clone(), document);
            previous.push((key, old));
        }

        let result = self.persist().await;
        if let Err(e) = &result {
            warn!(error = %e, writes = previous.len(), "Snapshot write failed, rolling back");
            // Reverse order so repeated keys end at their oldest value
            for (key, old) in previous.into_iter().rev() {
                match old {
                    Some(document) => {
                        self.documents.insert(key, document);
                    }
                    None => {
                        self.documents.remove(&key);
                    }
                }
            }
        }

        if let (Some(health), Some(_)) = (&self.health, &self.snapshot_path) {
            match &result {
                Ok(()) => health.set_healthy(components::STORE).await,
                Err(e) => {
                    health
                        .set_degraded(components::STORE, format!("Snapshot write failed: {}", e))
                        .await
                }
            }
        }

        result
    }

    /// Rewrite the snapshot file; callers hold `write_lock`
    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot = Snapshot {
            project_id: self.project_id.clone(),
            documents: self
                .documents
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json).await?;
        tokio::fs::rename(&temp_path, path).await?;

        debug!(path = %path.display(), documents = snapshot.documents.len(), "Wrote store snapshot");
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let data = std::fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| {
        HealError::Storage(format!("failed to parse snapshot {}: {}", path.display(), e))
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        Ok(self
            .documents
            .get(&path.to_string())
            .map(|entry| entry.value().clone()))
    }

    async fn set(&self, path: &DocumentPath, document: Document) -> Result<()> {
        self.apply(vec![(path.to_string(), document)]).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let writes: Vec<_> = batch
            .into_writes()
            .into_iter()
            .map(|(path, document)| (path.to_string(), document))
            .collect();
        let count = writes.len();
        self.apply(writes).await?;
        debug!(writes = count, "Committed write batch");
        Ok(())
    }
}
