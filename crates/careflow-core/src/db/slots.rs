//! Slot catalog database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::SlotCatalog;

impl Database {
    /// Insert or replace the catalog for one doctor-day. Labels are stored
    /// as a JSON array so publication order survives the round trip.
    pub fn upsert_slot_catalog(&self, catalog: &SlotCatalog) -> DbResult<()> {
        let labels_json = serde_json::to_string(&catalog.labels)?;

        self.conn.execute(
            r#"
            INSERT INTO slot_catalogs (doctor_id, slot_date, labels, published_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(doctor_id, slot_date) DO UPDATE SET
                labels = excluded.labels,
                published_at = excluded.published_at
            "#,
            params![
                catalog.doctor_id,
                catalog.date,
                labels_json,
                catalog.published_at,
            ],
        )?;

        Ok(())
    }

    /// Get the published catalog for a doctor-day, if any.
    pub fn get_slot_catalog(&self, doctor_id: &str, date: &str) -> DbResult<Option<SlotCatalog>> {
        self.conn
            .query_row(
                r#"
                SELECT doctor_id, slot_date, labels, published_at
                FROM slot_catalogs
                WHERE doctor_id = ?1 AND slot_date = ?2
                "#,
                params![doctor_id, date],
                |row| {
                    Ok(SlotCatalogRow {
                        doctor_id: row.get(0)?,
                        slot_date: row.get(1)?,
                        labels: row.get(2)?,
                        published_at: row.get(3)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

/// Intermediate row struct for database mapping.
struct SlotCatalogRow {
    doctor_id: String,
    slot_date: String,
    labels: String,
    published_at: String,
}

impl TryFrom<SlotCatalogRow> for SlotCatalog {
    type Error = DbError;

    fn try_from(row: SlotCatalogRow) -> Result<Self, Self::Error> {
        let labels: Vec<String> = serde_json::from_str(&row.labels)?;

        Ok(SlotCatalog {
            doctor_id: row.doctor_id,
            date: row.slot_date,
            labels,
            published_at: row.published_at,
        })
    }
}
