//! Incident database operations.
//!
//! All mutation goes through a single conditional statement keyed on the
//! incident's current status; a write that finds a different status changes
//! nothing and reports zero rows.

use rusqlite::{params, params_from_iter, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Incident, IncidentOrdering, IncidentReport, IncidentStatus};

/// Side fields applied together with a status change. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct IncidentUpdate {
    pub dispatcher_id: Option<String>,
    pub ambulance_id: Option<String>,
    pub transport_started_at: Option<String>,
    pub arrived_at: Option<String>,
    pub cancel_reason: Option<String>,
}

impl Database {
    /// Insert a freshly reported incident and return its assigned number.
    /// The number is computed inside the statement, so concurrent reports
    /// from separate connections still get distinct sequential numbers.
    pub fn insert_incident(
        &self,
        id: &str,
        report: &IncidentReport,
        reported_at: &str,
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO incidents (
                id, incident_number, status, location, reporter_contact,
                nature, reported_at, updated_at
            ) VALUES (
                ?1,
                (SELECT COALESCE(MAX(incident_number), 0) + 1 FROM incidents),
                ?2, ?3, ?4, ?5, ?6, ?6
            )
            "#,
            params![
                id,
                IncidentStatus::Reported.as_str(),
                report.location,
                report.reporter_contact,
                report.nature,
                reported_at,
            ],
        )?;

        let number = self.conn.query_row(
            "SELECT incident_number FROM incidents WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(number)
    }

    /// Get an incident by ID.
    pub fn get_incident(&self, id: &str) -> DbResult<Option<Incident>> {
        self.conn
            .query_row(
                r#"
                SELECT id, incident_number, status, location, reporter_contact,
                       nature, dispatcher_id, ambulance_id, reported_at,
                       transport_started_at, arrived_at, cancel_reason, updated_at
                FROM incidents
                WHERE id = ?
                "#,
                [id],
                map_incident_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Conditional status update: applies only if the stored status equals
    /// `expected`, writing the side fields in the same statement. Returns
    /// whether a row was changed.
    pub fn update_incident_status(
        &self,
        id: &str,
        expected: IncidentStatus,
        target: IncidentStatus,
        fields: &IncidentUpdate,
        updated_at: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE incidents SET
                status = ?3,
                dispatcher_id = COALESCE(?4, dispatcher_id),
                ambulance_id = COALESCE(?5, ambulance_id),
                transport_started_at = COALESCE(?6, transport_started_at),
                arrived_at = COALESCE(?7, arrived_at),
                cancel_reason = COALESCE(?8, cancel_reason),
                updated_at = ?9
            WHERE id = ?1 AND status = ?2
            "#,
            params![
                id,
                expected.as_str(),
                target.as_str(),
                fields.dispatcher_id,
                fields.ambulance_id,
                fields.transport_started_at,
                fields.arrived_at,
                fields.cancel_reason,
                updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// List incidents whose status is in the given set, in the requested
    /// order. An empty status set yields an empty list.
    pub fn list_incidents_by_status(
        &self,
        statuses: &[IncidentStatus],
        ordering: IncidentOrdering,
    ) -> DbResult<Vec<Incident>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let order_clause = match ordering {
            IncidentOrdering::ReportedDesc => "reported_at DESC, incident_number DESC",
            IncidentOrdering::TransportAsc => "transport_started_at ASC, incident_number ASC",
        };
        let sql = format!(
            r#"
            SELECT id, incident_number, status, location, reporter_contact,
                   nature, dispatcher_id, ambulance_id, reported_at,
                   transport_started_at, arrived_at, cancel_reason, updated_at
            FROM incidents
            WHERE status IN ({placeholders})
            ORDER BY {order_clause}
            "#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(statuses.iter().map(|s| s.as_str())),
            map_incident_row,
        )?;

        let mut incidents = Vec::new();
        for row in rows {
            incidents.push(row?.try_into()?);
        }
        Ok(incidents)
    }
}

/// Intermediate row struct for database mapping.
struct IncidentRow {
    id: String,
    incident_number: i64,
    status: String,
    location: String,
    reporter_contact: String,
    nature: String,
    dispatcher_id: Option<String>,
    ambulance_id: Option<String>,
    reported_at: String,
    transport_started_at: Option<String>,
    arrived_at: Option<String>,
    cancel_reason: Option<String>,
    updated_at: String,
}

fn map_incident_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IncidentRow> {
    Ok(IncidentRow {
        id: row.get(0)?,
        incident_number: row.get(1)?,
        status: row.get(2)?,
        location: row.get(3)?,
        reporter_contact: row.get(4)?,
        nature: row.get(5)?,
        dispatcher_id: row.get(6)?,
        ambulance_id: row.get(7)?,
        reported_at: row.get(8)?,
        transport_started_at: row.get(9)?,
        arrived_at: row.get(10)?,
        cancel_reason: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<IncidentRow> for Incident {
    type Error = DbError;

    fn try_from(row: IncidentRow) -> Result<Self, Self::Error> {
        let status = IncidentStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown incident status: {}", row.status)))?;

        Ok(Incident {
            id: row.id,
            incident_number: row.incident_number,
            status,
            location: row.location,
            reporter_contact: row.reporter_contact,
            nature: row.nature,
            dispatcher_id: row.dispatcher_id,
            ambulance_id: row.ambulance_id,
            reported_at: row.reported_at,
            transport_started_at: row.transport_started_at,
            arrived_at: row.arrived_at,
            cancel_reason: row.cancel_reason,
            updated_at: row.updated_at,
        })
    }
}
