//! Stakeholder resolution: free-text "directions" cells to departments
//!
//! Each name in a directions cell becomes a Department (plus its head
//! JobPosition) the first time it is seen. Existing reference records are
//! never overwritten, so re-running an import keeps their codes stable.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::model::{Department, JobPosition, Stored};
use crate::store::{Collection, DocumentStore, Filter, from_document, to_document};

use super::context::RunContext;

/// Names shorter than this are noise (stray initials, punctuation)
const MIN_NAME_CHARS: usize = 2;

/// Characters of a single-word name used as its code
const SINGLE_WORD_CODE_CHARS: usize = 3;

/// Initials kept for a multi-word name
const MAX_INITIALS: usize = 4;

/// Split a directions cell on newlines and commas, dropping noise
pub fn split_stakeholders(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|name| name.chars().count() >= MIN_NAME_CHARS)
        .map(str::to_string)
        .collect()
}

/// Candidate code for a department name
/// e.g. "Direction Network Engineering" -> "DNE", "Finance" -> "FIN", "IT" -> "IT"
pub fn base_code(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let code: String = if words.len() > 1 {
        words
            .iter()
            .filter_map(|w| w.chars().next())
            .take(MAX_INITIALS)
            .collect()
    } else {
        name.chars().take(SINGLE_WORD_CODE_CHARS).collect()
    };
    code.to_uppercase()
}

/// Find a code for `name` that no other department uses
///
/// The base code is accepted when it is free or already belongs to a
/// department with the same name; otherwise 1, 2, 3... are appended until
/// that holds.
pub async fn unique_code(store: &dyn DocumentStore, name: &str, base: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut counter = 1;

    loop {
        let by_code = Filter::all().where_eq("code", candidate.as_str());
        let existing = store.find_one(Collection::Departments, &by_code).await?;

        let owner = match existing {
            None => return Ok(candidate),
            Some(doc) => from_document::<Stored<Department>>(doc)?.record.name,
        };
        if owner == name {
            return Ok(candidate);
        }

        log::debug!(
            "Code {} already used by '{}', trying next suffix for '{}'",
            candidate,
            owner,
            name
        );
        candidate = format!("{}{}", base, counter);
        counter += 1;
    }
}

/// Outcome of resolving one stakeholder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDepartment {
    pub name: String,
    pub code: String,
    pub department_id: String,
    pub department_created: bool,
    pub job_position_created: bool,
}

/// Ensure a department and its head job position exist for `name`
pub async fn resolve_department(ctx: &RunContext, name: &str) -> Result<ResolvedDepartment> {
    let store = ctx.store();
    let now = Utc::now();

    let code = unique_code(store, name, &base_code(name)).await?;

    let department_filter = Filter::all().where_eq("name", name);
    let department_outcome = store
        .insert_if_absent(
            Collection::Departments,
            &department_filter,
            to_document(&Department::new(name, code, now))?,
        )
        .await
        .with_context(|| format!("Failed to upsert department '{}'", name))?;

    let department: Stored<Department> = from_document(
        store
            .find_one(Collection::Departments, &department_filter)
            .await?
            .with_context(|| format!("Department '{}' missing after upsert", name))?,
    )?;

    let position = JobPosition::head_of(&department.id, &department.record, now);
    let position_outcome = store
        .insert_if_absent(
            Collection::JobPositions,
            &Filter::all()
                .where_eq("title", name)
                .where_eq("department_id", department.id.as_str()),
            to_document(&position)?,
        )
        .await
        .with_context(|| format!("Failed to upsert job position '{}'", name))?;

    if department_outcome.was_inserted() {
        log::info!("Created department '{}' ({})", name, department.record.code);
    }

    Ok(ResolvedDepartment {
        name: name.to_string(),
        code: department.record.code,
        department_id: department.id,
        department_created: department_outcome.was_inserted(),
        job_position_created: position_outcome.was_inserted(),
    })
}

/// Counts of reference records created during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceStats {
    pub departments_created: usize,
    pub job_positions_created: usize,
}

impl ReferenceStats {
    pub fn record(&mut self, resolved: &ResolvedDepartment) {
        if resolved.department_created {
            self.departments_created += 1;
        }
        if resolved.job_position_created {
            self.job_positions_created += 1;
        }
    }

    pub fn merge(&mut self, other: ReferenceStats) {
        self.departments_created += other.departments_created;
        self.job_positions_created += other.job_positions_created;
    }
}

/// Resolve every name of a directions cell, returning the stakeholder list
pub async fn resolve_stakeholders(
    ctx: &RunContext,
    directions: &str,
    stats: &mut ReferenceStats,
) -> Result<Vec<String>> {
    let mut stakeholders = Vec::new();
    for name in split_stakeholders(directions) {
        let resolved = resolve_department(ctx, &name).await?;
        stats.record(&resolved);
        stakeholders.push(resolved.name);
    }
    Ok(stakeholders)
}
