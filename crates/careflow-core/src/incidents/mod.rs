//! Incident registry: the ledger of emergency incidents and the sole
//! writer of their lifecycle state.
//!
//! Lifecycle: Reported → Dispatched → Transporting → Arrived → Closed,
//! with Cancelled reachable from any state before arrival.

use thiserror::Error;

use crate::db::{Database, IncidentUpdate};
use crate::models::{now_timestamp, Incident, IncidentOrdering, IncidentReport, IncidentStatus};

/// Incident registry errors.
#[derive(Error, Debug)]
pub enum IncidentError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Incident not found: {0}")]
    NotFound(String),

    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },

    #[error("Concurrent update: expected status {expected}, found {actual}")]
    Conflict {
        expected: IncidentStatus,
        actual: IncidentStatus,
    },
}

pub type IncidentResult<T> = Result<T, IncidentError>;

/// Registry of emergency incidents. Every status change funnels through
/// [`IncidentRegistry::transition_with`], which issues one conditional
/// write keyed on the caller's expected status.
pub struct IncidentRegistry<'a> {
    db: &'a Database,
}

impl<'a> IncidentRegistry<'a> {
    /// Create a new registry over the given database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// File a new incident: validate the intake fields, assign the next
    /// sequential incident number, stamp status Reported.
    pub fn report_incident(&self, report: IncidentReport) -> IncidentResult<Incident> {
        // 1. Required intake fields must be present
        report.validate().map_err(IncidentError::Validation)?;

        // 2. Insert; the number is assigned inside the database
        let id = uuid::Uuid::new_v4().to_string();
        let reported_at = now_timestamp();
        let incident_number = self.db.insert_incident(&id, &report, &reported_at)?;

        tracing::info!("Incident {} reported as number {}", id, incident_number);

        // 3. Hand back the stored shape without a second read
        Ok(Incident {
            id,
            incident_number,
            status: IncidentStatus::Reported,
            location: report.location,
            reporter_contact: report.reporter_contact,
            nature: report.nature,
            dispatcher_id: None,
            ambulance_id: None,
            reported_at: reported_at.clone(),
            transport_started_at: None,
            arrived_at: None,
            cancel_reason: None,
            updated_at: reported_at,
        })
    }

    /// Fetch one incident, failing if it is unknown.
    pub fn get(&self, id: &str) -> IncidentResult<Incident> {
        self.db
            .get_incident(id)?
            .ok_or_else(|| IncidentError::NotFound(id.to_string()))
    }

    /// Move an incident along one lifecycle edge. Succeeds only if the
    /// stored status still equals `expected`; a caller holding a stale
    /// snapshot gets `Conflict` and must re-read before trying again.
    pub fn transition(
        &self,
        id: &str,
        target: IncidentStatus,
        expected: IncidentStatus,
    ) -> IncidentResult<Incident> {
        self.transition_with(id, target, expected, IncidentUpdate::default())
    }

    /// Like [`transition`](Self::transition), but writes side fields in the
    /// same conditional statement as the status change, so a half-applied
    /// update can never be observed.
    pub fn transition_with(
        &self,
        id: &str,
        target: IncidentStatus,
        expected: IncidentStatus,
        fields: IncidentUpdate,
    ) -> IncidentResult<Incident> {
        // 1. Refuse edges the lifecycle graph does not contain
        if !expected.can_transition_to(target) {
            return Err(IncidentError::IllegalTransition {
                from: expected,
                to: target,
            });
        }

        // 2. One conditional write keyed on the expected status
        let updated_at = now_timestamp();
        let applied = self
            .db
            .update_incident_status(id, expected, target, &fields, &updated_at)?;
        if applied {
            tracing::info!("Incident {} moved {} -> {}", id, expected, target);
            return self.get(id);
        }

        // 3. Nothing matched; distinguish a missing incident from one
        //    another actor already advanced
        match self.db.get_incident(id)? {
            None => Err(IncidentError::NotFound(id.to_string())),
            Some(current) => {
                tracing::warn!(
                    "Incident {} transition {} -> {} lost to concurrent writer (now {})",
                    id,
                    expected,
                    target,
                    current.status
                );
                Err(IncidentError::Conflict {
                    expected,
                    actual: current.status,
                })
            }
        }
    }

    /// Incidents whose status is in `statuses`, in the requested ordering.
    pub fn list_by_status(
        &self,
        statuses: &[IncidentStatus],
        ordering: IncidentOrdering,
    ) -> IncidentResult<Vec<Incident>> {
        Ok(self.db.list_incidents_by_status(statuses, ordering)?)
    }

    /// Dispatch board: every incident still in motion, newest report first.
    pub fn dispatch_board(&self) -> IncidentResult<Vec<Incident>> {
        self.list_by_status(
            &[
                IncidentStatus::Reported,
                IncidentStatus::Dispatched,
                IncidentStatus::Transporting,
                IncidentStatus::Arrived,
            ],
            IncidentOrdering::ReportedDesc,
        )
    }

    /// ER incoming queue: ambulances on the road or just arrived, ordered
    /// so the next expected arrival sorts first.
    pub fn er_incoming(&self) -> IncidentResult<Vec<Incident>> {
        self.list_by_status(
            &[IncidentStatus::Transporting, IncidentStatus::Arrived],
            IncidentOrdering::TransportAsc,
        )
    }
}
