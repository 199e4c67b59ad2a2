//! Records written by the importer
//!
//! Field names match what the process management backend reads from the
//! store, so every struct serializes with snake_case keys. Ids are carried
//! separately through [`Stored`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version stamped on freshly imported process documents
pub const INITIAL_DOCUMENT_VERSION: &str = "1.0";

/// Suffix appended to a department code to build its head job position code
pub const JOB_POSITION_CODE_SUFFIX: &str = "-H";

/// A record read back from the store together with its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub record: T,
}

/// Top-level grouping, one per workbook sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub code: String,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    pub code: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Department {
    pub fn new(name: impl Into<String>, code: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job position derived from a department (title mirrors the department name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosition {
    pub title: String,
    pub department_id: String,
    pub code: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosition {
    /// Head position for a department
    pub fn head_of(department_id: &str, department: &Department, now: DateTime<Utc>) -> Self {
        Self {
            title: department.name.clone(),
            department_id: department_id.to_string(),
            code: format!("{}{}", department.code, JOB_POSITION_CODE_SUFFIX),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A task embedded in a process document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub code: String,
    pub description: String,
    pub order: u32,
}

impl Task {
    /// Task at 1-based position `order` within the process `process_code`
    pub fn new(process_code: &str, order: u32, description: impl Into<String>) -> Self {
        Self {
            code: format!("{}_T{}", process_code, order),
            description: description.into(),
            order,
        }
    }
}

/// Lifecycle state of a process document
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    AuthorReview,
    AuthorSigned,
    VerifierReview,
    VerifierSigned,
    ValidatorReview,
    Approved,
    Archived,
}

impl DocumentStatus {
    /// Value as stored in the `status` field
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::AuthorReview => "author_review",
            DocumentStatus::AuthorSigned => "author_signed",
            DocumentStatus::VerifierReview => "verifier_review",
            DocumentStatus::VerifierSigned => "verifier_signed",
            DocumentStatus::ValidatorReview => "validator_review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signature teams on a document; always empty on import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributors {
    pub authors: Vec<Value>,
    pub verifiers: Vec<Value>,
    pub validators: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub objectives: Vec<String>,
    pub implicated_actors: Vec<String>,
    pub management_rules: Vec<String>,
    pub terminology: Vec<String>,
    pub change_history: Vec<Value>,
}

/// A process under a macro, stored in the `documents` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDocument {
    pub macro_id: String,
    pub process_code: String,
    pub title: String,
    pub description: String,
    pub stakeholders: Vec<String>,
    pub tasks: Vec<Task>,
    pub status: DocumentStatus,
    pub version: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub contributors: Contributors,
    pub metadata: DocumentMetadata,
}

/// Process code for the `sequence`-th process of a macro
pub fn process_code(macro_code: &str, sequence: usize) -> String {
    format!("{}_P{}", macro_code, sequence)
}

/// Minimal view of a user account; only used to pick the record creator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
}
