// src/store/postgres.rs

use crate::store::{Collection, Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    PgPool, Row,
    postgres::PgPoolOptions,
    types::Json,
};
use std::time::Duration;
use uuid::Uuid;

/// Document collections kept as JSONB rows in a single `documents` table.
pub struct PgDocumentStore {
    pool: Option<PgPool>,
}

impl PgDocumentStore {
    /// The pool connects lazily, so an unreachable database shows up as a
    /// transient error on first use rather than here.
    pub fn from_url(database_url: Option<&str>) -> Result<Self, StoreError> {
        let pool = match database_url {
            Some(url) => Some(
                PgPoolOptions::new()
                    .max_connections(10)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect_lazy(url)?,
            ),
            None => None,
        };
        Ok(Self { pool })
    }

    fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool.as_ref().ok_or(StoreError::NotConfigured)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    async fn prepare(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(self.pool()?)
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, data FROM documents WHERE collection = $1 ORDER BY created_at, id",
        )
        .bind(collection.as_str())
        .fetch_all(self.pool()?)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let Json(data): Json<Value> = row.try_get("data")?;
                match data {
                    Value::Object(map) => Ok((id, map)),
                    _ => Err(StoreError::Decode(format!(
                        "{}/{} is not a JSON object",
                        collection, id
                    ))),
                }
            })
            .collect()
    }

    async fn create(&self, collection: Collection, body: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"INSERT INTO documents (collection, id, data, created_at, updated_at)
               VALUES ($1, $2, $3, NOW(), NOW())"#,
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(Json(Value::Object(body)))
        .execute(self.pool()?)
        .await?;
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE documents SET data = data || $3, updated_at = NOW()
               WHERE collection = $1 AND id = $2"#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(Value::Object(fields)))
        .execute(self.pool()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(self.pool()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
