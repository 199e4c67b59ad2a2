//! Per-run state shared by every import operation

use std::sync::Arc;

use anyhow::Result;

use crate::model::User;
use crate::store::{Collection, DocumentStore, Filter, document_id, from_document, new_id};

/// Where the creator identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorSource {
    /// User with the configured email
    ConfiguredUser,
    /// First user in the store
    AnyUser,
    /// No users at all; a fresh id was generated
    Placeholder,
}

/// Identity stamped as `created_by` on macros and processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub id: String,
    pub source: CreatorSource,
}

/// Pick the creator: configured email, else any user, else a placeholder id
pub async fn resolve_creator(store: &dyn DocumentStore, email: &str) -> Result<Creator> {
    let by_email = store
        .find_one(Collection::Users, &Filter::all().where_eq("email", email))
        .await?;
    if let Some(user) = by_email {
        return Ok(Creator {
            id: document_id(&user)?,
            source: CreatorSource::ConfiguredUser,
        });
    }

    if let Some(user) = store.find_one(Collection::Users, &Filter::all()).await? {
        let id = document_id(&user)?;
        let other: User = from_document(user)?;
        log::warn!(
            "No user with email {}, attributing records to {} ({})",
            email,
            id,
            other.email.as_deref().unwrap_or("no email")
        );
        return Ok(Creator {
            id,
            source: CreatorSource::AnyUser,
        });
    }

    let id = new_id();
    log::warn!(
        "No users in store, attributing records to placeholder id {}",
        id
    );
    Ok(Creator {
        id,
        source: CreatorSource::Placeholder,
    })
}

/// Store handle and creator for one command invocation
#[derive(Clone)]
pub struct RunContext {
    store: Arc<dyn DocumentStore>,
    pub creator: Creator,
}

impl RunContext {
    /// Build the context, resolving the creator once
    pub async fn new(store: Arc<dyn DocumentStore>, creator_email: &str) -> Result<Self> {
        let creator = resolve_creator(store.as_ref(), creator_email).await?;
        log::info!(
            "Records will be created by {} ({:?})",
            creator.id,
            creator.source
        );
        Ok(Self { store, creator })
    }

    pub fn with_creator(store: Arc<dyn DocumentStore>, creator: Creator) -> Self {
        Self { store, creator }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
