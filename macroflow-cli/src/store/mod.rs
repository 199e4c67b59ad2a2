//! Document store abstraction
//!
//! Records are schemaless JSON objects grouped into named collections. Every
//! record carries a string `_id` assigned on insert.
//!
//! Backends only implement the storage primitives (`find_all`, `insert_document`,
//! `save_document`, `delete_many`). The upsert flavours the importer relies on are
//! provided on top of those:
//! - `insert_if_absent`: reference data, never overwritten once present
//! - `replace_upsert`: refreshable content, body replaced on every write

pub mod memory;
pub mod sqlite;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A stored record
pub type Document = Map<String, Value>;

/// Name of the identifier field present on every stored record
pub const ID_FIELD: &str = "_id";

/// Logical collections known to the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Macros,
    Departments,
    JobPositions,
    Documents,
    Users,
}

impl Collection {
    /// Collection name as persisted
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Macros => "macros",
            Collection::Departments => "departments",
            Collection::JobPositions => "job_positions",
            Collection::Documents => "documents",
            Collection::Users => "users",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Equality filter over top-level fields
///
/// An empty filter matches every record. A `null` condition also matches
/// records where the field is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching a single record by id
    pub fn by_id(id: &str) -> Self {
        Self::all().where_eq(ID_FIELD, id)
    }

    /// Add an equality condition
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check a record against every condition
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| match doc.get(field) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }

    /// Fields copied into a record created by an upsert
    fn seed(&self) -> Document {
        self.conditions
            .iter()
            .filter(|(field, _)| field != ID_FIELD)
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

/// Result of an upsert: the id of the affected record and whether it was created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(String),
    Matched(String),
}

impl UpsertOutcome {
    pub fn id(&self) -> &str {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Matched(id) => id,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted(_))
    }
}

/// Storage backend for the importer collections
///
/// Read-then-write sequences are not transactional. Callers are expected to be
/// the only writer for the duration of a run.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All records matching `filter`, in insertion order
    async fn find_all(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>>;

    /// Store a new record. The record must already carry an `_id`.
    async fn insert_document(&self, collection: Collection, doc: Document) -> Result<()>;

    /// Overwrite the body of the record with the given id
    async fn save_document(&self, collection: Collection, id: &str, doc: Document) -> Result<()>;

    /// Remove every matching record, returning the number removed
    async fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64>;

    /// First matching record in insertion order
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find_all(collection, filter).await?.into_iter().next())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        Ok(self.find_all(collection, filter).await?.len() as u64)
    }

    /// Create the record from `filter` + `fields` unless a match already exists.
    /// Existing records are left untouched.
    async fn insert_if_absent(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpsertOutcome> {
        if let Some(existing) = self.find_one(collection, filter).await? {
            return Ok(UpsertOutcome::Matched(document_id(&existing)?));
        }

        let id = insert_new(self, collection, filter, fields).await?;
        Ok(UpsertOutcome::Inserted(id))
    }

    /// Replace the body of the first matching record with `filter` + `fields`
    /// (keeping its id), or create it when nothing matches.
    async fn replace_upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpsertOutcome> {
        let Some(existing) = self.find_one(collection, filter).await? else {
            let id = insert_new(self, collection, filter, fields).await?;
            return Ok(UpsertOutcome::Inserted(id));
        };

        let id = document_id(&existing)?;
        let mut body = filter.seed();
        body.extend(fields);
        body.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        self.save_document(collection, &id, body).await?;

        Ok(UpsertOutcome::Matched(id))
    }

    /// Set `fields` on the first matching record. Returns 1 when the record changed.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<u64> {
        let Some(mut doc) = self.find_one(collection, filter).await? else {
            return Ok(0);
        };

        if !set_fields(&mut doc, &fields) {
            return Ok(0);
        }

        let id = document_id(&doc)?;
        self.save_document(collection, &id, doc).await?;
        Ok(1)
    }

    /// Set `fields` on every matching record, returning how many changed
    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<u64> {
        let mut modified = 0;
        for mut doc in self.find_all(collection, filter).await? {
            if !set_fields(&mut doc, &fields) {
                continue;
            }
            let id = document_id(&doc)?;
            self.save_document(collection, &id, doc).await?;
            modified += 1;
        }
        Ok(modified)
    }
}

/// Insert `filter` + `fields` as a new record under a fresh id
async fn insert_new<S: DocumentStore + ?Sized>(
    store: &S,
    collection: Collection,
    filter: &Filter,
    fields: Document,
) -> Result<String> {
    let id = new_id();
    let mut doc = filter.seed();
    doc.extend(fields);
    doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    store.insert_document(collection, doc).await?;
    Ok(id)
}

/// Generate a fresh record id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read the `_id` of a stored record
pub fn document_id(doc: &Document) -> Result<String> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("Stored record has no string _id")
}

/// Serialize a record into a document body
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    let value = serde_json::to_value(record)
        .context("Failed to serialize record")?;
    match value {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("Record did not serialize to an object: {}", other),
    }
}

/// Deserialize a stored document into a typed record
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(Value::Object(doc))
        .context("Failed to deserialize stored record")
}

/// Apply `$set`-style field assignment, returning whether anything changed
fn set_fields(doc: &mut Document, fields: &Document) -> bool {
    let mut changed = false;
    for (field, value) in fields {
        if doc.get(field) != Some(value) {
            doc.insert(field.clone(), value.clone());
            changed = true;
        }
    }
    changed
}
