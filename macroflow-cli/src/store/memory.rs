//! In-process document store used for dry runs and tests

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use super::{Collection, Document, DocumentStore, Filter, ID_FIELD};

/// Document store that keeps every collection in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collection<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut Vec<Document>) -> Result<T>,
    ) -> Result<T> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        f(collections.entry(collection).or_default())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        self.with_collection(collection, |docs| {
            Ok(docs.iter().filter(|d| filter.matches(d)).cloned().collect())
        })
    }

    async fn insert_document(&self, collection: Collection, doc: Document) -> Result<()> {
        self.with_collection(collection, |docs| {
            if !doc.contains_key(ID_FIELD) {
                bail!("Cannot insert into {} without an _id", collection);
            }
            docs.push(doc);
            Ok(())
        })
    }

    async fn save_document(&self, collection: Collection, id: &str, doc: Document) -> Result<()> {
        let filter = Filter::by_id(id);
        self.with_collection(collection, |docs| {
            let slot = docs
                .iter_mut()
                .find(|d| filter.matches(d))
                .ok_or_else(|| anyhow!("No record {} in {}", id, collection))?;
            *slot = doc;
            Ok(())
        })
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        self.with_collection(collection, |docs| {
            let before = docs.len();
            docs.retain(|d| !filter.matches(d));
            Ok((before - docs.len()) as u64)
        })
    }
}
