//! Incident models for the emergency patient-flow lifecycle.

use serde::{Deserialize, Serialize};

/// Incident status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IncidentStatus {
    /// Reported by a caller, waiting for dispatch
    Reported,
    /// Dispatcher and ambulance assigned
    Dispatched,
    /// Patient en route to the ER
    Transporting,
    /// Patient arrived at the ER
    Arrived,
    /// Handled and closed after arrival
    Closed,
    /// Cancelled before arrival
    Cancelled,
}

impl IncidentStatus {
    /// Legal transition table. Any edge not listed here is rejected.
    pub fn can_transition_to(self, target: IncidentStatus) -> bool {
        use IncidentStatus::*;
        matches!(
            (self, target),
            (Reported, Dispatched)
                | (Reported, Cancelled)
                | (Dispatched, Transporting)
                | (Dispatched, Cancelled)
                | (Transporting, Arrived)
                | (Transporting, Cancelled)
                | (Arrived, Closed)
        )
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, IncidentStatus::Closed | IncidentStatus::Cancelled)
    }

    /// Storage/display form of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Reported => "reported",
            IncidentStatus::Dispatched => "dispatched",
            IncidentStatus::Transporting => "transporting",
            IncidentStatus::Arrived => "arrived",
            IncidentStatus::Closed => "closed",
            IncidentStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the storage form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reported" => Some(IncidentStatus::Reported),
            "dispatched" => Some(IncidentStatus::Dispatched),
            "transporting" => Some(IncidentStatus::Transporting),
            "arrived" => Some(IncidentStatus::Arrived),
            "closed" => Some(IncidentStatus::Closed),
            "cancelled" => Some(IncidentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orderings for incident listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentOrdering {
    /// Newest report first (dispatch board).
    ReportedDesc,
    /// Earliest transport start first, ties broken by incident number
    /// (ER incoming queue).
    TransportAsc,
}

/// An emergency incident record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    /// Unique incident ID
    pub id: String,
    /// Sequential human-facing number, assigned at insert
    pub incident_number: i64,
    /// Current lifecycle status
    pub status: IncidentStatus,
    /// Where the emergency is
    pub location: String,
    /// How to reach the reporter
    pub reporter_contact: String,
    /// Nature of the emergency as reported
    pub nature: String,
    /// Dispatcher assigned at the Dispatched transition, never cleared
    pub dispatcher_id: Option<String>,
    /// Ambulance assigned at the Dispatched transition, never cleared
    pub ambulance_id: Option<String>,
    /// When the report was taken
    pub reported_at: String,
    /// When transport to the ER began
    pub transport_started_at: Option<String>,
    /// When the patient arrived at the ER
    pub arrived_at: Option<String>,
    /// Reason given at cancellation
    pub cancel_reason: Option<String>,
    /// Last mutation timestamp
    pub updated_at: String,
}

impl Incident {
    /// Incident number formatted for boards and radio ("INC-000042").
    pub fn display_number(&self) -> String {
        format!("INC-{:06}", self.incident_number)
    }
}

/// Fields supplied when an incident is reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentReport {
    /// Where the emergency is
    pub location: String,
    /// How to reach the reporter
    pub reporter_contact: String,
    /// Nature of the emergency as reported
    pub nature: String,
}

impl IncidentReport {
    /// Create a report from raw intake fields.
    pub fn new(location: String, reporter_contact: String, nature: String) -> Self {
        Self {
            location,
            reporter_contact,
            nature,
        }
    }

    /// Check the required intake fields are present.
    pub fn validate(&self) -> Result<(), String> {
        if self.location.trim().is_empty() {
            return Err("location is required".into());
        }
        if self.reporter_contact.trim().is_empty() {
            return Err("reporter contact is required".into());
        }
        if self.nature.trim().is_empty() {
            return Err("nature is required".into());
        }
        Ok(())
    }
}
