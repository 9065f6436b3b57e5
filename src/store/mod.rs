// src/store/mod.rs
//
// Collection-level access to the remote document store. The raw boundary is
// untyped JSON documents; `RemoteStore` layers the domain records on top.

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod snapshot;

use crate::models::{Department, Employee, Expense, LedgerSnapshot};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::info;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Departments,
    Employees,
    Expenses,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Departments => "departments",
            Collection::Employees => "employees",
            Collection::Expenses => "expenses",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// No endpoint or credentials. Never retried; selects local mode.
    #[error("Document store is not configured")]
    NotConfigured,

    #[error("Document store unavailable: {0}")]
    Transient(String),

    #[error("Document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("Malformed document: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Transient(e.to_string())
    }
}

/// Untyped document store with one collection per entity kind.
///
/// `create` is the only operation that produces an identifier.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Queried once at start-up.
    fn is_configured(&self) -> bool;

    /// Schema preparation run before the first read.
    async fn prepare(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError>;

    async fn create(&self, collection: Collection, body: Document) -> Result<String, StoreError>;

    /// Shallow-merges `fields` into the stored document.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// A domain record living in its own collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

impl Record for Department {
    const COLLECTION: Collection = Collection::Departments;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Record for Employee {
    const COLLECTION: Collection = Collection::Employees;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Record for Expense {
    const COLLECTION: Collection = Collection::Expenses;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Serializes a record or patch into a document body. The `id` key is dropped:
/// identifiers live beside the document, never inside it.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Decode(e.to_string()))? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::Decode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

fn from_document<T: Record>(id: String, mut body: Document) -> Result<T, StoreError> {
    body.insert("id".to_string(), Value::String(id.clone()));
    serde_json::from_value(Value::Object(body))
        .map_err(|e| StoreError::Decode(format!("{}/{}: {}", T::COLLECTION, id, e)))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub departments: usize,
    pub employees: usize,
    pub expenses: usize,
}

/// Typed adapter over a [`DocumentStore`].
#[derive(Clone)]
pub struct RemoteStore {
    inner: Arc<dyn DocumentStore>,
}

impl RemoteStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self { inner }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    pub async fn prepare(&self) -> Result<(), StoreError> {
        self.inner.prepare().await
    }

    pub async fn list_all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        self.inner
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(|(id, body)| from_document(id, body))
            .collect()
    }

    pub async fn create(
        &self,
        collection: Collection,
        body: Document,
    ) -> Result<String, StoreError> {
        self.inner.create(collection, body).await
    }

    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }

    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    /// Populates each empty collection with its defaults. Every collection is
    /// checked on its own; a non-empty collection is never written to.
    pub async fn seed(&self, defaults: &LedgerSnapshot) -> Result<SeedReport, StoreError> {
        let report = SeedReport {
            departments: self.seed_collection(&defaults.departments).await?,
            employees: self.seed_collection(&defaults.employees).await?,
            expenses: self.seed_collection(&defaults.expenses).await?,
        };

        if report != SeedReport::default() {
            info!(
                "Seeded document store: {} departments, {} employees, {} expenses",
                report.departments, report.employees, report.expenses
            );
        }
        Ok(report)
    }

    async fn seed_collection<T: Record>(&self, records: &[T]) -> Result<usize, StoreError> {
        if !self.inner.list(T::COLLECTION).await?.is_empty() {
            return Ok(0);
        }
        for record in records {
            self.inner.create(T::COLLECTION, to_document(record)?).await?;
        }
        Ok(records.len())
    }
}
