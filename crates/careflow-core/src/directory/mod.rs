//! Directory read-through cache.
//!
//! The hospital directory (doctors, patients, dispatchers, ambulances)
//! lives in an upstream system and incident or appointment rows only carry
//! its IDs. Presentation layers resolve an ID to a display summary here
//! instead of joining upstream data into every read path.

use thiserror::Error;

use crate::db::Database;
use crate::models::{now_timestamp, RefKind, RefSummary};

/// Directory errors.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Resolves directory references against the local summary cache.
pub struct DirectoryResolver<'a> {
    db: &'a Database,
}

impl<'a> DirectoryResolver<'a> {
    /// Create a new resolver over the given database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve a reference to its cached summary. An unknown reference is
    /// `None`, not an error; the ID may simply not have synced yet.
    pub fn resolve_ref(&self, kind: RefKind, id: &str) -> DirectoryResult<Option<RefSummary>> {
        Ok(self.db.get_directory_entry(kind, id)?)
    }

    /// Store or refresh a summary, stamping the sync time.
    pub fn upsert_entry(
        &self,
        kind: RefKind,
        id: &str,
        display_name: &str,
        detail: Option<String>,
    ) -> DirectoryResult<RefSummary> {
        if id.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "Reference ID must not be blank".into(),
            ));
        }
        if display_name.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "Display name must not be blank".into(),
            ));
        }

        let entry = RefSummary {
            kind,
            id: id.to_string(),
            display_name: display_name.to_string(),
            detail,
            last_synced: Some(now_timestamp()),
        };
        self.db.upsert_directory_entry(&entry)?;
        Ok(entry)
    }
}
