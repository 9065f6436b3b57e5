// src/store/memory.rs
//
// In-process document store for tests. Calls can be made to fail, or be held
// until the test releases them.

use crate::store::{Collection, Document, DocumentStore, StoreError};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::sync::Semaphore;

pub struct MemoryStore {
    configured: bool,
    collections: Mutex<HashMap<Collection, Vec<(String, Document)>>>,
    next_id: AtomicU64,
    failing: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            configured: true,
            collections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
            gate: Mutex::new(None),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Every subsequent call fails with a transient error.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Every subsequent call waits for a permit on the returned semaphore.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn documents(&self, collection: Collection) -> Vec<(String, Document)> {
        self.collections
            .lock()
            .unwrap()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    async fn enter(&self) -> Result<(), StoreError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| StoreError::Transient(e.to_string()))?
                .forget();
        }
        if !self.configured {
            return Err(StoreError::NotConfigured);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Transient("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError> {
        self.enter().await?;
        Ok(self.documents(collection))
    }

    async fn create(&self, collection: Collection, body: Document) -> Result<String, StoreError> {
        self.enter().await?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.collections
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .push((id.clone(), body));
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.enter().await?;
        let mut collections = self.collections.lock().unwrap();
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        doc.1.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.enter().await?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|(doc_id, _)| doc_id != id);
        if docs.len() == before {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
