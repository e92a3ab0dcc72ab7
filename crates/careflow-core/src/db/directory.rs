//! Directory reference database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{RefKind, RefSummary};

impl Database {
    /// Insert or refresh a directory summary.
    pub fn upsert_directory_entry(&self, entry: &RefSummary) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO directory_entries (kind, id, display_name, detail, last_synced)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(kind, id) DO UPDATE SET
                display_name = excluded.display_name,
                detail = excluded.detail,
                last_synced = excluded.last_synced
            "#,
            params![
                entry.kind.as_str(),
                entry.id,
                entry.display_name,
                entry.detail,
                entry.last_synced,
            ],
        )?;

        Ok(())
    }

    /// Get the cached summary for a reference, if one has been synced.
    pub fn get_directory_entry(&self, kind: RefKind, id: &str) -> DbResult<Option<RefSummary>> {
        self.conn
            .query_row(
                r#"
                SELECT kind, id, display_name, detail, last_synced
                FROM directory_entries
                WHERE kind = ?1 AND id = ?2
                "#,
                params![kind.as_str(), id],
                |row| {
                    Ok(DirectoryRow {
                        kind: row.get(0)?,
                        id: row.get(1)?,
                        display_name: row.get(2)?,
                        detail: row.get(3)?,
                        last_synced: row.get(4)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

/// Intermediate row struct for database mapping.
struct DirectoryRow {
    kind: String,
    id: String,
    display_name: String,
    detail: Option<String>,
    last_synced: Option<String>,
}

impl TryFrom<DirectoryRow> for RefSummary {
    type Error = DbError;

    fn try_from(row: DirectoryRow) -> Result<Self, Self::Error> {
        let kind = RefKind::parse(&row.kind)
            .ok_or_else(|| DbError::Constraint(format!("Unknown ref kind: {}", row.kind)))?;

        Ok(RefSummary {
            kind,
            id: row.id,
            display_name: row.display_name,
            detail: row.detail,
            last_synced: row.last_synced,
        })
    }
}
