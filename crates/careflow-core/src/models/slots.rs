//! Slot catalog model: the bookable labels for one doctor-day.

use serde::{Deserialize, Serialize};

use super::now_timestamp;

/// The published set of bookable slot labels for one doctor on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotCatalog {
    /// Doctor reference (resolved by the external directory)
    pub doctor_id: String,
    /// Calendar day, YYYY-MM-DD
    pub date: String,
    /// Slot labels in publication order (e.g. ["09:00", "09:30"])
    pub labels: Vec<String>,
    /// When this catalog was (re)published
    pub published_at: String,
}

impl SlotCatalog {
    /// Create a catalog for publication.
    pub fn new(doctor_id: String, date: String, labels: Vec<String>) -> Self {
        Self {
            doctor_id,
            date,
            labels,
            published_at: now_timestamp(),
        }
    }

    /// Whether the label is one of the published slots.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}
