//! Cached summaries of external directory references.

use serde::{Deserialize, Serialize};

/// Kind of a foreign reference held by incidents and appointments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RefKind {
    Doctor,
    Patient,
    Dispatcher,
    Ambulance,
}

impl RefKind {
    /// Storage/display form of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            RefKind::Doctor => "doctor",
            RefKind::Patient => "patient",
            RefKind::Dispatcher => "dispatcher",
            RefKind::Ambulance => "ambulance",
        }
    }

    /// Parse the storage form back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "doctor" => Some(RefKind::Doctor),
            "patient" => Some(RefKind::Patient),
            "dispatcher" => Some(RefKind::Dispatcher),
            "ambulance" => Some(RefKind::Ambulance),
            _ => None,
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display summary for one foreign reference, cached from the hospital
/// directory service. The core only ever stores the opaque id; summaries
/// exist for presentation reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefSummary {
    /// What the reference points at
    pub kind: RefKind,
    /// Opaque id as used by incidents and appointments
    pub id: String,
    /// Human-facing name (doctor name, ambulance call sign, ...)
    pub display_name: String,
    /// Extra display detail (specialty, unit base, ...)
    pub detail: Option<String>,
    /// When this summary was last refreshed from the directory feed
    pub last_synced: Option<String>,
}
