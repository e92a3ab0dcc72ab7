//! Dispatch coordination: moves incidents through the ambulance leg of
//! their lifecycle.
//!
//! Each operation is one conditional write against the registry; there is
//! no read-modify-write window for a second dispatcher to slip into.

use chrono::{DateTime, Utc};

use crate::db::{Database, IncidentUpdate};
use crate::incidents::{IncidentError, IncidentRegistry, IncidentResult};
use crate::models::{format_timestamp, Incident, IncidentStatus};

/// Coordinates dispatcher and ambulance actions on incidents.
pub struct DispatchCoordinator<'a> {
    registry: IncidentRegistry<'a>,
}

impl<'a> DispatchCoordinator<'a> {
    /// Create a new coordinator over the given database.
    pub fn new(db: &'a Database) -> Self {
        Self {
            registry: IncidentRegistry::new(db),
        }
    }

    /// Assign a dispatcher and ambulance to a reported incident, moving it
    /// to Dispatched. Both assignments land in the same write as the status
    /// change, so a second caller can never see a half-assigned incident.
    pub fn assign_dispatch(
        &self,
        incident_id: &str,
        dispatcher_id: &str,
        ambulance_id: &str,
    ) -> IncidentResult<Incident> {
        if dispatcher_id.trim().is_empty() {
            return Err(IncidentError::Validation(
                "Dispatcher ID must not be blank".into(),
            ));
        }
        if ambulance_id.trim().is_empty() {
            return Err(IncidentError::Validation(
                "Ambulance ID must not be blank".into(),
            ));
        }

        self.registry.transition_with(
            incident_id,
            IncidentStatus::Dispatched,
            IncidentStatus::Reported,
            IncidentUpdate {
                dispatcher_id: Some(dispatcher_id.to_string()),
                ambulance_id: Some(ambulance_id.to_string()),
                ..Default::default()
            },
        )
    }

    /// Record that the ambulance is rolling, moving Dispatched to
    /// Transporting with transportStartedAt set to now.
    pub fn record_transport_start(&self, incident_id: &str) -> IncidentResult<Incident> {
        self.record_transport_start_at(incident_id, Utc::now())
    }

    /// Variant taking the start time explicitly; radio reports are often
    /// relayed minutes after the wheels actually moved.
    pub fn record_transport_start_at(
        &self,
        incident_id: &str,
        started: DateTime<Utc>,
    ) -> IncidentResult<Incident> {
        self.registry.transition_with(
            incident_id,
            IncidentStatus::Transporting,
            IncidentStatus::Dispatched,
            IncidentUpdate {
                transport_started_at: Some(format_timestamp(started)),
                ..Default::default()
            },
        )
    }

    /// Record hospital arrival, moving Transporting to Arrived with
    /// arrivedAt set to now.
    pub fn record_arrival(&self, incident_id: &str) -> IncidentResult<Incident> {
        self.record_arrival_at(incident_id, Utc::now())
    }

    /// Variant taking the arrival time explicitly.
    pub fn record_arrival_at(
        &self,
        incident_id: &str,
        arrived: DateTime<Utc>,
    ) -> IncidentResult<Incident> {
        self.registry.transition_with(
            incident_id,
            IncidentStatus::Arrived,
            IncidentStatus::Transporting,
            IncidentUpdate {
                arrived_at: Some(format_timestamp(arrived)),
                ..Default::default()
            },
        )
    }

    /// Close out an arrived incident.
    pub fn close_incident(&self, incident_id: &str) -> IncidentResult<Incident> {
        self.registry.transition(
            incident_id,
            IncidentStatus::Closed,
            IncidentStatus::Arrived,
        )
    }

    /// Cancel an incident that has not yet arrived. The stored status is
    /// read first and used as the write condition, so a cancellation racing
    /// a lifecycle advance resolves to exactly one winner.
    pub fn cancel_incident(&self, incident_id: &str, reason: &str) -> IncidentResult<Incident> {
        let current = self.registry.get(incident_id)?;
        self.registry.transition_with(
            incident_id,
            IncidentStatus::Cancelled,
            current.status,
            IncidentUpdate {
                cancel_reason: Some(reason.to_string()),
                ..Default::default()
            },
        )
    }
}
