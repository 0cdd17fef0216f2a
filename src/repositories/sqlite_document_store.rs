// src/repositories/sqlite_document_store.rs
//
// Local document backend on SQLite. Every collection shares the
// `documents` table; field maps are stored as JSON text.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

use super::document_store::{Document, DocumentStore, Fields};
use crate::db::{get_connection, ConnectionPool};
use crate::error::{AppError, AppResult};

pub struct SqliteDocumentStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteDocumentStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Runs blocking SQLite work off the async executor.
    async fn run<T, F>(&self, work: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            work(&mut conn)
        })
        .await?
    }

    /// Map database row to Document - returns rusqlite::Error for query_map compatibility
    fn row_to_document(row: &Row) -> Result<Document, rusqlite::Error> {
        let id: String = row.get("id")?;
        let data: String = row.get("data")?;
        let fields = parse_fields(&data)?;
        Ok(Document { id, fields })
    }
}

fn parse_fields(data: &str) -> Result<Fields, rusqlite::Error> {
    serde_json::from_str(data).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        let collection = collection.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, data FROM documents
                 WHERE collection = ?1
                 ORDER BY position",
            )?;

            let docs = stmt
                .query_map(params![collection], Self::row_to_document)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(docs)
        })
        .await
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.run(move |conn| {
            let doc = conn
                .query_row(
                    "SELECT id, data FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    Self::row_to_document,
                )
                .optional()?;
            Ok(doc)
        })
        .await
    }

    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String> {
        let collection = collection.to_string();
        let data = serde_json::to_string(&fields)?;
        self.run(move |conn| {
            let id = Uuid::new_v4().simple().to_string();
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO documents (collection, id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![collection, id, data, now],
            )?;
            Ok(id)
        })
        .await
    }

    async fn overwrite(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.run(move |conn| {
            let tx = conn.transaction()?;

            let data: Option<String> = tx
                .query_row(
                    "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get(0),
                )
                .optional()?;

            let mut stored = match data {
                Some(data) => parse_fields(&data)?,
                None => return Err(AppError::NotFound(format!("{}/{}", collection, id))),
            };
            stored.extend(fields);

            tx.execute(
                "UPDATE documents SET data = ?1, updated_at = ?2
                 WHERE collection = ?3 AND id = ?4",
                params![
                    serde_json::to_string(&stored)?,
                    Utc::now().to_rfc3339(),
                    collection,
                    id
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.run(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?;
            if rows_affected == 0 {
                log::debug!("delete of missing document {}/{} ignored", collection, id);
            }
            Ok(())
        })
        .await
    }
}
