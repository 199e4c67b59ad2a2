//! Store maintenance: bulk status transitions and collection wipes

use anyhow::{Context, Result};
use serde_json::Value;

use crate::model::DocumentStatus;
use crate::store::{Collection, Document, DocumentStore, Filter};

/// Collections cleared before a full repopulation, in deletion order
pub const IMPORTED_COLLECTIONS: [Collection; 4] = [
    Collection::Macros,
    Collection::Documents,
    Collection::JobPositions,
    Collection::Departments,
];

/// Collections cleared before a reference data rebuild
pub const REFERENCE_COLLECTIONS: [Collection; 2] = [
    Collection::JobPositions,
    Collection::Departments,
];

/// Move every process document in state `from` to state `to`.
/// Returns how many documents changed.
pub async fn transition_status(
    store: &dyn DocumentStore,
    from: DocumentStatus,
    to: DocumentStatus,
) -> Result<u64> {
    let mut fields = Document::new();
    fields.insert("status".to_string(), Value::String(to.as_str().to_string()));

    let modified = store
        .update_many(
            Collection::Documents,
            &Filter::all().where_eq("status", from.as_str()),
            fields,
        )
        .await
        .with_context(|| format!("Failed to move documents from {} to {}", from, to))?;

    log::info!("Moved {} documents from {} to {}", modified, from, to);
    Ok(modified)
}

/// Delete every record of each collection, returning the deleted counts
pub async fn wipe_collections(
    store: &dyn DocumentStore,
    collections: &[Collection],
) -> Result<Vec<(Collection, u64)>> {
    let mut cleared = Vec::with_capacity(collections.len());
    for &collection in collections {
        let deleted = store
            .delete_many(collection, &Filter::all())
            .await
            .with_context(|| format!("Failed to clear {}", collection))?;
        log::info!("Cleared {} records from {}", deleted, collection);
        cleared.push((collection, deleted));
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn add_document(store: &MemoryStore, title: &str, status: &str) {
        let mut fields = Document::new();
        fields.insert("status".into(), json!(status));
        let by_title = Filter::all().where_eq("title", title);
        store
            .insert_if_absent(Collection::Documents, &by_title, fields)
            .await
            .unwrap();
    }

    async fn count_status(store: &MemoryStore, status: &str) -> u64 {
        let filter = Filter::all().where_eq("status", status);
        store.count(Collection::Documents, &filter).await.unwrap()
    }

    #[tokio::test]
    async fn test_draft_documents_become_approved() {
        let store = MemoryStore::new();
        for i in 0..5 {
            add_document(&store, &format!("draft {}", i), "draft").await;
        }
        for i in 0..3 {
            add_document(&store, &format!("approved {}", i), "approved").await;
        }

        let modified = transition_status(&store, DocumentStatus::Draft, DocumentStatus::Approved)
            .await
            .unwrap();

        assert_eq!(modified, 5);
        assert_eq!(count_status(&store, "approved").await, 8);
    }

    #[tokio::test]
    async fn test_transition_without_matches() {
        let store = MemoryStore::new();
        add_document(&store, "a", "archived").await;

        let modified = transition_status(&store, DocumentStatus::Draft, DocumentStatus::Approved)
            .await
            .unwrap();
        assert_eq!(modified, 0);
    }

    #[tokio::test]
    async fn test_transition_to_same_status_changes_nothing() {
        let store = MemoryStore::new();
        add_document(&store, "a", "draft").await;
        add_document(&store, "b", "draft").await;

        let modified = transition_status(&store, DocumentStatus::Draft, DocumentStatus::Draft)
            .await
            .unwrap();
        assert_eq!(modified, 0);
        assert_eq!(count_status(&store, "draft").await, 2);
    }

    #[tokio::test]
    async fn test_wipe_collections() {
        let store = MemoryStore::new();
        add_document(&store, "a", "draft").await;
        add_document(&store, "b", "draft").await;
        store
            .insert_if_absent(
                Collection::Users,
                &Filter::all().where_eq("email", "admin@k-j.store"),
                Document::new(),
            )
            .await
            .unwrap();

        let cleared = wipe_collections(&store, &IMPORTED_COLLECTIONS)
            .await
            .unwrap();
        assert_eq!(
            cleared,
            vec![
                (Collection::Macros, 0),
                (Collection::Documents, 2),
                (Collection::JobPositions, 0),
                (Collection::Departments, 0),
            ]
        );
        // Users are never wiped
        let users = store.count(Collection::Users, &Filter::all()).await;
        assert_eq!(users.unwrap(), 1);
    }
}
