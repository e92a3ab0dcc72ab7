//! Careflow Core Library
//!
//! Local-first hospital patient-flow coordination: emergency incidents,
//! ambulance dispatch, outpatient slot booking, and kiosk check-in.
//!
//! # Architecture
//!
//! ```text
//! Emergency leg                             Outpatient leg
//!
//! call intake → report_incident            staff → publish_slot_catalog
//!                    │                                    │
//!               [Reported]                  patient → book_slot
//!                    │ assign_dispatch                    │
//!              [Dispatched]                        [Appointment]
//!                    │ record_transport_start             │ issue_checkin_token
//!             [Transporting]                   token (5 min, single use)
//!                    │ record_arrival                     │ validate_checkin_token
//!               [Arrived]                          kiosk check-in
//!                    │ close_incident
//!                [Closed]      (Cancelled reachable until arrival)
//! ```
//!
//! # Core Principle
//!
//! **Every lifecycle mutation is one conditional write.** No locks are held
//! around state transitions and nothing retries internally; a writer that
//! loses a race gets a typed conflict and the caller decides what to do.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer; all conditional-write statements live here
//! - [`models`]: Domain types (Incident, Appointment, SlotCatalog, etc.)
//! - [`incidents`]: Incident registry and lifecycle state machine
//! - [`dispatch`]: Dispatcher and ambulance actions on incidents
//! - [`booking`]: Slot catalogs and appointment booking
//! - [`checkin`]: One-shot kiosk check-in tokens
//! - [`directory`]: Read-through cache of directory references

pub mod booking;
pub mod checkin;
pub mod db;
pub mod directory;
pub mod dispatch;
pub mod incidents;
pub mod models;

// Re-export commonly used types
pub use booking::{BookingError, SlotAllocator};
pub use checkin::{CheckInError, CheckInTokenService};
pub use db::Database;
pub use directory::{DirectoryError, DirectoryResolver};
pub use dispatch::DispatchCoordinator;
pub use incidents::{IncidentError, IncidentRegistry};
pub use models::{
    Appointment, AppointmentStatus, Incident, IncidentOrdering, IncidentReport, IncidentStatus,
    IssuedToken, RefKind, RefSummary, SlotCatalog,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

/// Stable error taxonomy crossing the FFI boundary. The variant is the
/// machine-readable code; the payload is the human-readable message.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CareflowError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    IllegalTransition(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidSlot(String),

    #[error("{0}")]
    SlotConflict(String),

    #[error("{0}")]
    Expired(String),

    #[error("{0}")]
    Mismatch(String),

    #[error("{0}")]
    AlreadyConsumed(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<db::DbError> for CareflowError {
    fn from(e: db::DbError) -> Self {
        CareflowError::Unavailable(e.to_string())
    }
}

impl From<IncidentError> for CareflowError {
    fn from(e: IncidentError) -> Self {
        match e {
            IncidentError::Database(inner) => CareflowError::Unavailable(inner.to_string()),
            other @ IncidentError::Validation(_) => {
                CareflowError::ValidationError(other.to_string())
            }
            other @ IncidentError::NotFound(_) => CareflowError::NotFound(other.to_string()),
            other @ IncidentError::IllegalTransition { .. } => {
                CareflowError::IllegalTransition(other.to_string())
            }
            other @ IncidentError::Conflict { .. } => CareflowError::Conflict(other.to_string()),
        }
    }
}

impl From<BookingError> for CareflowError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Database(inner) => CareflowError::Unavailable(inner.to_string()),
            other @ BookingError::Validation(_) => CareflowError::ValidationError(other.to_string()),
            other @ BookingError::NotFound(_) => CareflowError::NotFound(other.to_string()),
            other @ BookingError::InvalidSlot { .. } => {
                CareflowError::InvalidSlot(other.to_string())
            }
            other @ BookingError::SlotConflict { .. } => {
                CareflowError::SlotConflict(other.to_string())
            }
        }
    }
}

impl From<CheckInError> for CareflowError {
    fn from(e: CheckInError) -> Self {
        match e {
            CheckInError::Database(inner) => CareflowError::Unavailable(inner.to_string()),
            other @ CheckInError::NotFound(_) => CareflowError::NotFound(other.to_string()),
            other @ CheckInError::Expired => CareflowError::Expired(other.to_string()),
            other @ CheckInError::Mismatch => CareflowError::Mismatch(other.to_string()),
            other @ CheckInError::AlreadyConsumed => {
                CareflowError::AlreadyConsumed(other.to_string())
            }
        }
    }
}

impl From<DirectoryError> for CareflowError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Database(inner) => CareflowError::Unavailable(inner.to_string()),
            other @ DirectoryError::Validation(_) => {
                CareflowError::ValidationError(other.to_string())
            }
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CareflowError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CareflowError::Unavailable(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<CareflowCore>, CareflowError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(CareflowCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<CareflowCore>, CareflowError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(CareflowCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CareflowCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl CareflowCore {
    // =========================================================================
    // Incident Operations
    // =========================================================================

    /// File a new emergency incident.
    pub fn report_incident(
        &self,
        location: String,
        reporter_contact: String,
        nature: String,
    ) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let registry = IncidentRegistry::new(&db);
        let report = IncidentReport::new(location, reporter_contact, nature);
        let incident = registry.report_incident(report)?;
        Ok(incident.into())
    }

    /// Get an incident by ID.
    pub fn get_incident(&self, incident_id: String) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let registry = IncidentRegistry::new(&db);
        Ok(registry.get(&incident_id)?.into())
    }

    /// Dispatch board: every incident still in motion, newest report first.
    pub fn list_dispatch_board(&self) -> Result<Vec<FfiIncident>, CareflowError> {
        let db = self.db.lock()?;
        let registry = IncidentRegistry::new(&db);
        let incidents = registry.dispatch_board()?;
        Ok(incidents.into_iter().map(|i| i.into()).collect())
    }

    /// ER incoming queue: transporting or arrived incidents, next expected
    /// arrival first.
    pub fn list_er_incoming(&self) -> Result<Vec<FfiIncident>, CareflowError> {
        let db = self.db.lock()?;
        let registry = IncidentRegistry::new(&db);
        let incidents = registry.er_incoming()?;
        Ok(incidents.into_iter().map(|i| i.into()).collect())
    }

    // =========================================================================
    // Dispatch Operations
    // =========================================================================

    /// Assign a dispatcher and ambulance to a reported incident.
    pub fn assign_dispatch(
        &self,
        incident_id: String,
        dispatcher_id: String,
        ambulance_id: String,
    ) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let coordinator = DispatchCoordinator::new(&db);
        let incident = coordinator.assign_dispatch(&incident_id, &dispatcher_id, &ambulance_id)?;
        Ok(incident.into())
    }

    /// Record that the ambulance started transporting.
    pub fn record_transport_start(&self, incident_id: String) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let coordinator = DispatchCoordinator::new(&db);
        Ok(coordinator.record_transport_start(&incident_id)?.into())
    }

    /// Record hospital arrival.
    pub fn record_arrival(&self, incident_id: String) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let coordinator = DispatchCoordinator::new(&db);
        Ok(coordinator.record_arrival(&incident_id)?.into())
    }

    /// Close out an arrived incident.
    pub fn close_incident(&self, incident_id: String) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let coordinator = DispatchCoordinator::new(&db);
        Ok(coordinator.close_incident(&incident_id)?.into())
    }

    /// Cancel an incident that has not yet arrived.
    pub fn cancel_incident(
        &self,
        incident_id: String,
        reason: String,
    ) -> Result<FfiIncident, CareflowError> {
        let db = self.db.lock()?;
        let coordinator = DispatchCoordinator::new(&db);
        Ok(coordinator.cancel_incident(&incident_id, &reason)?.into())
    }

    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Publish (or replace) the slot catalog for one doctor-day.
    pub fn publish_slot_catalog(
        &self,
        doctor_id: String,
        date: String,
        labels: Vec<String>,
    ) -> Result<(), CareflowError> {
        let db = self.db.lock()?;
        let allocator = SlotAllocator::new(&db);
        allocator.publish_catalog(&doctor_id, &date, labels)?;
        Ok(())
    }

    /// Open slot labels for a doctor-day, in catalog order.
    pub fn list_available_slots(
        &self,
        doctor_id: String,
        date: String,
    ) -> Result<Vec<String>, CareflowError> {
        let db = self.db.lock()?;
        let allocator = SlotAllocator::new(&db);
        Ok(allocator.list_available_slots(&doctor_id, &date)?)
    }

    /// Book a catalog slot for a patient.
    pub fn book_slot(
        &self,
        doctor_id: String,
        date: String,
        label: String,
        patient_id: String,
    ) -> Result<FfiAppointment, CareflowError> {
        let db = self.db.lock()?;
        let allocator = SlotAllocator::new(&db);
        let appointment = allocator.book_slot(&doctor_id, &date, &label, &patient_id)?;
        Ok(appointment.into())
    }

    /// Cancel an appointment, freeing its slot. Idempotent.
    pub fn release_slot(&self, appointment_id: String) -> Result<FfiAppointment, CareflowError> {
        let db = self.db.lock()?;
        let allocator = SlotAllocator::new(&db);
        Ok(allocator.release_slot(&appointment_id)?.into())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: String) -> Result<FfiAppointment, CareflowError> {
        let db = self.db.lock()?;
        let allocator = SlotAllocator::new(&db);
        Ok(allocator.get_appointment(&appointment_id)?.into())
    }

    // =========================================================================
    // Check-In Operations
    // =========================================================================

    /// Issue a fresh check-in token for an appointment, replacing any
    /// prior one. The token value in the result is shown exactly once.
    pub fn issue_checkin_token(
        &self,
        appointment_id: String,
    ) -> Result<FfiIssuedToken, CareflowError> {
        let db = self.db.lock()?;
        let service = CheckInTokenService::new(&db);
        Ok(service.issue_token(&appointment_id)?.into())
    }

    /// Validate and consume a presented check-in token.
    pub fn validate_checkin_token(
        &self,
        appointment_id: String,
        token: String,
    ) -> Result<(), CareflowError> {
        let db = self.db.lock()?;
        let service = CheckInTokenService::new(&db);
        service.validate_token(&appointment_id, &token)?;
        Ok(())
    }

    // =========================================================================
    // Directory Operations
    // =========================================================================

    /// Resolve a directory reference to its cached summary, if synced.
    pub fn resolve_ref(
        &self,
        kind: String,
        id: String,
    ) -> Result<Option<FfiRefSummary>, CareflowError> {
        let kind = RefKind::parse(&kind)
            .ok_or_else(|| CareflowError::ValidationError(format!("Unknown ref kind: {kind}")))?;
        let db = self.db.lock()?;
        let resolver = DirectoryResolver::new(&db);
        let summary = resolver.resolve_ref(kind, &id)?;
        Ok(summary.map(|s| s.into()))
    }

    /// Store or refresh a directory summary.
    pub fn upsert_directory_entry(
        &self,
        kind: String,
        id: String,
        display_name: String,
        detail: Option<String>,
    ) -> Result<(), CareflowError> {
        let kind = RefKind::parse(&kind)
            .ok_or_else(|| CareflowError::ValidationError(format!("Unknown ref kind: {kind}")))?;
        let db = self.db.lock()?;
        let resolver = DirectoryResolver::new(&db);
        resolver.upsert_entry(kind, &id, &display_name, detail)?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe incident.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIncident {
    pub id: String,
    pub incident_number: i64,
    pub display_number: String,
    pub status: String,
    pub location: String,
    pub reporter_contact: String,
    pub nature: String,
    pub dispatcher_id: Option<String>,
    pub ambulance_id: Option<String>,
    pub reported_at: String,
    pub transport_started_at: Option<String>,
    pub arrived_at: Option<String>,
    pub cancel_reason: Option<String>,
}

impl From<Incident> for FfiIncident {
    fn from(incident: Incident) -> Self {
        Self {
            display_number: incident.display_number(),
            id: incident.id,
            incident_number: incident.incident_number,
            status: incident.status.as_str().to_string(),
            location: incident.location,
            reporter_contact: incident.reporter_contact,
            nature: incident.nature,
            dispatcher_id: incident.dispatcher_id,
            ambulance_id: incident.ambulance_id,
            reported_at: incident.reported_at,
            transport_started_at: incident.transport_started_at,
            arrived_at: incident.arrived_at,
            cancel_reason: incident.cancel_reason,
        }
    }
}

/// FFI-safe appointment. The token digest never crosses the boundary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time_slot: String,
    pub status: String,
    pub checkin_token_expires: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            time_slot: appointment.time_slot,
            status: appointment.status.as_str().to_string(),
            checkin_token_expires: appointment.checkin_token_expires,
        }
    }
}

/// FFI-safe issued token. The only place the token plaintext appears.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIssuedToken {
    pub appointment_id: String,
    pub token: String,
    pub expires_at: String,
}

impl From<IssuedToken> for FfiIssuedToken {
    fn from(issued: IssuedToken) -> Self {
        Self {
            appointment_id: issued.appointment_id,
            token: issued.token,
            expires_at: issued.expires_at,
        }
    }
}

/// FFI-safe directory summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRefSummary {
    pub kind: String,
    pub id: String,
    pub display_name: String,
    pub detail: Option<String>,
    pub last_synced: Option<String>,
}

impl From<RefSummary> for FfiRefSummary {
    fn from(summary: RefSummary) -> Self {
        Self {
            kind: summary.kind.as_str().to_string(),
            id: summary.id,
            display_name: summary.display_name,
            detail: summary.detail,
            last_synced: summary.last_synced,
        }
    }
}
