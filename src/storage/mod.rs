//! SQLite persistence for documents, entities, and chat history.
//!
//! Schema migrations live in `migrations/` and run at startup; re-running them is a no-op.

mod models;

use crate::{
    analysis::DocumentAnalysis,
    ner::{EntityType, LegalEntity},
    qdrant::compute_chunk_hash,
};
use models::{DocumentRow, EntityRow};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

pub use models::{ChatInteraction, DocumentSummary, StoredDocument};

/// Number of chat interactions returned when no limit is given.
pub const DEFAULT_CHAT_HISTORY_LIMIT: i64 = 10;
/// Number of documents listed when no limit is given.
pub const DEFAULT_DOCUMENT_LIST_LIMIT: i64 = 20;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Query or connection failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Schema migration failure.
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// Stored JSON could not be encoded or decoded.
    #[error("Invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Directory for the database file could not be created.
    #[error("Cannot create database directory {path}: {source}")]
    Io {
        /// Directory that was being created.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the document database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// Current time as a fixed-width RFC 3339 UTC string, so lexical order is chronological.
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
        ))
        .unwrap_or_else(|_| "1970-01-01T00:00:00.000000Z".to_string())
}

impl Database {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// Plain file paths are accepted alongside `sqlite:` URLs.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let url = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            let path = std::path::PathBuf::from(database_url);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
        };

        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        tracing::debug!(url = %url, "Database connected");
        Ok(Self { pool })
    }

    /// Connect and apply migrations.
    pub async fn setup(database_url: &str) -> Result<Self, StorageError> {
        let database = Self::connect(database_url).await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert a document and return its id.
    ///
    /// Type, summary, and key information stay null when no analysis is given.
    pub async fn save_document(
        &self,
        filename: &str,
        text: &str,
        analysis: Option<&DocumentAnalysis>,
    ) -> Result<i64, StorageError> {
        let key_information = analysis
            .map(|analysis| serde_json::to_string(&analysis.key_information))
            .transpose()?;
        let result = sqlx::query(
            "INSERT INTO documents (filename, document_type, document_type_explanation, upload_date, \
             document_text, content_hash, summary, key_information) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(filename)
        .bind(analysis.map(|analysis| analysis.document_type.label.as_str()))
        .bind(analysis.and_then(|analysis| analysis.document_type.explanation.as_deref()))
        .bind(now_timestamp())
        .bind(text)
        .bind(compute_chunk_hash(text))
        .bind(analysis.map(|analysis| analysis.summary.as_str()))
        .bind(key_information)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(document_id = id, filename, "Document saved");
        Ok(id)
    }

    /// Store a document's entities in one transaction.
    pub async fn save_entities(
        &self,
        document_id: i64,
        entities: &[LegalEntity],
    ) -> Result<(), StorageError> {
        if entities.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for entity in entities {
            sqlx::query(
                "INSERT INTO entities (document_id, entity_text, entity_type, start_pos, end_pos) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(document_id)
            .bind(&entity.text)
            .bind(entity.entity_type.label())
            .bind(entity.start as i64)
            .bind(entity.end as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::debug!(document_id, entities = entities.len(), "Entities saved");
        Ok(())
    }

    /// Record a question and answer; returns the interaction id.
    pub async fn save_chat_interaction(
        &self,
        document_id: i64,
        user_query: &str,
        assistant_response: &str,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO chat_history (document_id, user_query, assistant_response, timestamp) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(document_id)
        .bind(user_query)
        .bind(assistant_response)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Fetch a document with its parsed key information and entities.
    pub async fn get_document_by_id(
        &self,
        document_id: i64,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let Some(row) = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, filename, document_type, document_type_explanation, upload_date, \
             document_text, content_hash, summary, key_information \
             FROM documents WHERE id = ?",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let entity_rows = sqlx::query_as::<_, EntityRow>(
            "SELECT entity_text, entity_type, start_pos, end_pos \
             FROM entities WHERE document_id = ? ORDER BY start_pos, id",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        let key_information = match row.key_information.as_deref() {
            Some(raw) if !raw.trim().is_empty() => match serde_json::from_str(raw)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };

        Ok(Some(StoredDocument {
            id: row.id,
            filename: row.filename,
            document_type: row.document_type,
            document_type_explanation: row.document_type_explanation,
            upload_date: row.upload_date,
            document_text: row.document_text,
            content_hash: row.content_hash,
            summary: row.summary,
            key_information,
            entities: entity_rows
                .into_iter()
                .map(|entity| LegalEntity {
                    text: entity.entity_text,
                    start: entity.start_pos.max(0) as usize,
                    end: entity.end_pos.max(0) as usize,
                    entity_type: EntityType::from_label(&entity.entity_type),
                })
                .collect(),
        }))
    }

    /// Most recent interactions for a document, newest first.
    pub async fn get_chat_history(
        &self,
        document_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatInteraction>, StorageError> {
        Ok(sqlx::query_as::<_, ChatInteraction>(
            "SELECT id, document_id, user_query, assistant_response, timestamp \
             FROM chat_history WHERE document_id = ? \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(document_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Saved documents, newest first.
    pub async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentSummary>, StorageError> {
        Ok(sqlx::query_as::<_, DocumentSummary>(
            "SELECT id, filename, document_type, upload_date, summary \
             FROM documents ORDER BY upload_date DESC, id DESC LIMIT ?",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Delete a document with its entities and chat history; reports whether it existed.
    pub async fn delete_document(&self, document_id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recent document whose text hashes to `content_hash`.
    pub async fn find_document_by_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<DocumentSummary>, StorageError> {
        Ok(sqlx::query_as::<_, DocumentSummary>(
            "SELECT id, filename, document_type, upload_date, summary \
             FROM documents WHERE content_hash = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DocumentType;
    use serde_json::json;

    async fn database() -> Database {
        Database::setup("sqlite::memory:").await.expect("database")
    }

    fn analysis() -> DocumentAnalysis {
        DocumentAnalysis {
            summary: "Mutual NDA.".into(),
            document_type: DocumentType {
                label: "Non-Disclosure Agreement".into(),
                explanation: Some("Confidentiality obligations.".into()),
            },
            key_information: json!({"term": "2 years", "parties": {"discloser": "Acme"}})
                .as_object()
                .cloned()
                .expect("object"),
        }
    }

    #[tokio::test]
    async fn saves_and_reads_back_document_with_entities() {
        let db = database().await;
        let text = "Acme shall pay $500.";
        let id = db
            .save_document("nda.txt", text, Some(&analysis()))
            .await
            .expect("save");
        db.save_entities(
            id,
            &[
                LegalEntity::from_span(text, 15, 19, EntityType::Money),
                LegalEntity::from_span(text, 0, 4, EntityType::Party),
            ],
        )
        .await
        .expect("entities");

        let stored = db.get_document_by_id(id).await.expect("get").expect("row");
        assert_eq!(stored.filename, "nda.txt");
        assert_eq!(stored.document_type.as_deref(), Some("Non-Disclosure Agreement"));
        assert_eq!(stored.key_information["term"], json!("2 years"));
        assert_eq!(stored.content_hash, compute_chunk_hash(text));
        assert_eq!(stored.entities.len(), 2);
        assert_eq!(stored.entities[0].entity_type, EntityType::Party);
        assert_eq!(stored.entities[1].text, "$500");
        assert_eq!(stored.analysis(), Some(analysis()));
    }

    #[tokio::test]
    async fn unanalyzed_document_has_empty_key_information() {
        let db = database().await;
        let id = db.save_document("raw.txt", "text", None).await.expect("save");
        let stored = db.get_document_by_id(id).await.expect("get").expect("row");
        assert!(stored.key_information.is_empty());
        assert!(stored.document_type.is_none());
        assert!(stored.analysis().is_none());
        db.save_entities(id, &[]).await.expect("empty is a no-op");
    }

    #[tokio::test]
    async fn chat_history_is_newest_first_and_limited() {
        let db = database().await;
        let id = db.save_document("a.txt", "text", None).await.expect("save");
        for n in 0..12 {
            db.save_chat_interaction(id, &format!("q{n}"), &format!("a{n}"))
                .await
                .expect("chat");
        }

        let history = db
            .get_chat_history(id, DEFAULT_CHAT_HISTORY_LIMIT)
            .await
            .expect("history");
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].user_query, "q11");
        assert_eq!(history[9].user_query, "q2");
    }

    #[tokio::test]
    async fn delete_cascades_and_reports_existence() {
        let db = database().await;
        let text = "Pay $1.";
        let id = db.save_document("a.txt", text, None).await.expect("save");
        db.save_entities(id, &[LegalEntity::from_span(text, 4, 6, EntityType::Money)])
            .await
            .expect("entities");
        db.save_chat_interaction(id, "q", "a").await.expect("chat");

        assert!(db.delete_document(id).await.expect("delete"));
        assert!(!db.delete_document(id).await.expect("second delete"));
        assert!(db.get_document_by_id(id).await.expect("get").is_none());
        assert!(db.get_chat_history(id, 10).await.expect("history").is_empty());

        let entity_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entities WHERE document_id = ?")
                .bind(id)
                .fetch_one(&db.pool)
                .await
                .expect("count entities");
        assert_eq!(entity_rows, 0);
    }

    #[tokio::test]
    async fn unusable_database_directory_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("write");
        let path = blocker.join("nested").join("legalyze.db");

        let result = Database::connect(&path.to_string_lossy()).await;
        assert!(matches!(result, Err(StorageError::Io { ref path, .. }) if path.contains("nested")));
    }

    #[tokio::test]
    async fn list_and_hash_lookup_return_newest_first() {
        let db = database().await;
        let first = db.save_document("one.txt", "same", None).await.expect("save");
        let second = db.save_document("two.txt", "same", None).await.expect("save");
        db.save_document("three.txt", "other", None)
            .await
            .expect("save");

        let listed = db.list_documents(2).await.expect("list");
        let names: Vec<_> = listed.iter().map(|doc| doc.filename.as_str()).collect();
        assert_eq!(names, vec!["three.txt", "two.txt"]);

        let found = db
            .find_document_by_hash(&compute_chunk_hash("same"))
            .await
            .expect("lookup")
            .expect("match");
        assert_eq!(found.id, second);
        assert_ne!(found.id, first);
        assert!(
            db.find_document_by_hash("missing")
                .await
                .expect("lookup")
                .is_none()
        );
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = database().await;
        db.migrate().await.expect("second run");
    }

    #[test]
    fn timestamps_are_fixed_width() {
        let stamp = now_timestamp();
        assert_eq!(stamp.len(), "2025-01-01T00:00:00.000000Z".len());
        assert!(stamp.ends_with('Z'));
    }
}
