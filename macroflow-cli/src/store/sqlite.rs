//! SQLite-backed document store
//!
//! Every collection lives in a single `records` table keyed by
//! (collection, id) with the JSON body stored as text. Scalar filter
//! conditions are pushed down through `json_extract`; results are re-checked
//! in Rust so arrays and objects compare exactly.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::{Collection, Document, DocumentStore, Filter, ID_FIELD};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    UNIQUE (collection, id)
)
"#;

/// Document store persisted in a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://macroflow.db`), creating the database
    /// file and its parent directory when missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        // One connection per run; also keeps `sqlite::memory:` on a single database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", url))?;

        let store = Self { pool };
        store.init_schema().await?;
        log::debug!("Connected to document store at {}", url);
        Ok(store)
    }

    /// Private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Open a database file by path
    pub async fn open(path: &Path) -> Result<Self> {
        Self::connect(&format!("sqlite://{}", path.display())).await
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to create records table")?;
        Ok(())
    }
}

/// JSON path selecting a top-level field
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

/// Values that can be compared in SQL against `json_extract` output
enum SqlScalar {
    Null,
    Text(String),
    Int(i64),
    Real(f64),
}

fn sql_scalar(value: &Value) -> Option<SqlScalar> {
    match value {
        Value::Null => Some(SqlScalar::Null),
        Value::String(s) => Some(SqlScalar::Text(s.clone())),
        Value::Bool(b) => Some(SqlScalar::Int(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(SqlScalar::Int(i)),
            None => n.as_f64().map(SqlScalar::Real),
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn document_body(doc: &Document) -> Result<(String, String)> {
    let id = match doc.get(ID_FIELD) {
        Some(Value::String(id)) => id.clone(),
        _ => bail!("Record has no string _id"),
    };
    let body = serde_json::to_string(doc).context("Failed to encode record")?;
    Ok((id, body))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_all(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        let mut sql = String::from("SELECT body FROM records WHERE collection = ?");
        let mut pushed = Vec::new();
        for (field, value) in filter.conditions() {
            match sql_scalar(value) {
                Some(SqlScalar::Null) => {
                    sql.push_str(" AND json_extract(body, ?) IS NULL");
                    pushed.push((json_path(field), None));
                }
                Some(scalar) => {
                    sql.push_str(" AND json_extract(body, ?) = ?");
                    pushed.push((json_path(field), Some(scalar)));
                }
                None => {}
            }
        }
        sql.push_str(" ORDER BY seq");

        let mut query = sqlx::query_scalar::<_, String>(&sql).bind(collection.name());
        for (path, scalar) in pushed {
            query = query.bind(path);
            query = match scalar {
                Some(SqlScalar::Text(s)) => query.bind(s),
                Some(SqlScalar::Int(i)) => query.bind(i),
                Some(SqlScalar::Real(f)) => query.bind(f),
                Some(SqlScalar::Null) | None => query,
            };
        }

        let bodies = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query {}", collection))?;

        let mut docs = Vec::with_capacity(bodies.len());
        for body in bodies {
            let doc: Document = serde_json::from_str(&body)
                .with_context(|| format!("Corrupt record in {}", collection))?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn insert_document(&self, collection: Collection, doc: Document) -> Result<()> {
        let (id, body) = document_body(&doc)?;
        sqlx::query("INSERT INTO records (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection.name())
            .bind(&id)
            .bind(body)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert {} into {}", id, collection))?;
        Ok(())
    }

    async fn save_document(&self, collection: Collection, id: &str, doc: Document) -> Result<()> {
        let (_, body) = document_body(&doc)?;
        let result = sqlx::query("UPDATE records SET body = ? WHERE collection = ? AND id = ?")
            .bind(body)
            .bind(collection.name())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to save {} in {}", id, collection))?;

        if result.rows_affected() == 0 {
            bail!("No record {} in {}", id, collection);
        }
        Ok(())
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        if filter.is_empty() {
            let result = sqlx::query("DELETE FROM records WHERE collection = ?")
                .bind(collection.name())
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to clear {}", collection))?;
            return Ok(result.rows_affected());
        }

        let mut removed = 0;
        for doc in self.find_all(collection, filter).await? {
            let (id, _) = document_body(&doc)?;
            let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
                .bind(collection.name())
                .bind(&id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to delete {} from {}", id, collection))?;
            removed += result.rows_affected();
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_json_path_quotes_field() {
        assert_eq!(json_path("code"), "$.\"code\"");
        assert_eq!(json_path("_id"), "$.\"_id\"");
    }

    #[tokio::test]
    async fn test_scalar_filters_push_down() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .insert_if_absent(
                Collection::Departments,
                &Filter::all().where_eq("name", "Direction IT"),
                fields(json!({"code": "DI", "active": true, "rank": 2})),
            )
            .await
            .unwrap();
        store
            .insert_if_absent(
                Collection::Departments,
                &Filter::all().where_eq("name", "Finance"),
                fields(json!({"code": "FIN", "active": false, "rank": 3})),
            )
            .await
            .unwrap();

        let fin = Filter::all().where_eq("code", "FIN");
        let by_code = store
            .find_one(Collection::Departments, &fin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_code.get("name"), Some(&json!("Finance")));

        let active = Filter::all().where_eq("active", true);
        let active = store
            .count(Collection::Departments, &active)
            .await
            .unwrap();
        assert_eq!(active, 1);

        let ranked = Filter::all().where_eq("rank", 2);
        let ranked = store
            .count(Collection::Departments, &ranked)
            .await
            .unwrap();
        assert_eq!(ranked, 1);

        let no_parent = Filter::all().where_eq("parent_id", Value::Null);
        let missing = store
            .count(Collection::Departments, &no_parent)
            .await
            .unwrap();
        assert_eq!(missing, 2);

        // Collections do not leak into each other
        let none = store
            .count(Collection::JobPositions, &Filter::all())
            .await
            .unwrap();
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn test_array_filters_checked_in_rust() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .insert_if_absent(
                Collection::Documents,
                &Filter::all().where_eq("title", "A"),
                fields(json!({"stakeholders": ["IT", "RH"]})),
            )
            .await
            .unwrap();

        let hit = store
            .count(
                Collection::Documents,
                &Filter::all().where_eq("stakeholders", json!(["IT", "RH"])),
            )
            .await
            .unwrap();
        let partial = Filter::all().where_eq("stakeholders", json!(["IT"]));
        let miss = store.count(Collection::Documents, &partial).await.unwrap();
        assert_eq!(hit, 1);
        assert_eq!(miss, 0);
    }

    #[tokio::test]
    async fn test_replace_and_delete_roundtrip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let filter = Filter::all().where_eq("code", "Macro01");

        let first = store
            .replace_upsert(Collection::Macros, &filter, fields(json!({"name": "Old"})))
            .await
            .unwrap();
        let second = store
            .replace_upsert(Collection::Macros, &filter, fields(json!({"name": "New"})))
            .await
            .unwrap();
        assert_eq!(first.id(), second.id());

        let stored = store
            .find_all(Collection::Macros, &Filter::all())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get("name"), Some(&json!("New")));

        let removed = store
            .delete_many(Collection::Macros, &filter)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let left = store.count(Collection::Macros, &Filter::all()).await;
        assert_eq!(left.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("macroflow.db");

        let store = SqliteStore::open(&path).await.unwrap();
        store
            .insert_if_absent(
                Collection::Users,
                &Filter::all().where_eq("email", "a@b.c"),
                Document::new(),
            )
            .await
            .unwrap();

        assert!(path.exists());
    }
}
