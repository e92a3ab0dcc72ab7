//! Outpatient slot allocation.
//!
//! Clinic staff publish a per-doctor-day catalog of slot labels; patients
//! claim labels through one atomic insert, so the last open slot goes to
//! exactly one of any number of concurrent callers.

use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::db::Database;
use crate::models::{now_timestamp, Appointment, SlotCatalog};

/// Slot allocation errors.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Slot {label} is not in the catalog for doctor {doctor_id} on {date}")]
    InvalidSlot {
        doctor_id: String,
        date: String,
        label: String,
    },

    #[error("Slot {label} for doctor {doctor_id} on {date} is already booked")]
    SlotConflict {
        doctor_id: String,
        date: String,
        label: String,
    },
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Allocates outpatient slots against published catalogs.
pub struct SlotAllocator<'a> {
    db: &'a Database,
}

impl<'a> SlotAllocator<'a> {
    /// Create a new allocator over the given database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Publish (or replace) the slot catalog for one doctor-day. An empty
    /// label list is allowed and closes the day for new bookings.
    pub fn publish_catalog(
        &self,
        doctor_id: &str,
        date: &str,
        labels: Vec<String>,
    ) -> BookingResult<SlotCatalog> {
        // 1. Shape checks
        if doctor_id.trim().is_empty() {
            return Err(BookingError::Validation("Doctor ID must not be blank".into()));
        }
        validate_date(date).map_err(BookingError::Validation)?;
        let mut seen = HashSet::new();
        for label in &labels {
            if label.trim().is_empty() {
                return Err(BookingError::Validation(
                    "Slot labels must not be blank".into(),
                ));
            }
            if !seen.insert(label.as_str()) {
                return Err(BookingError::Validation(format!(
                    "Duplicate slot label: {label}"
                )));
            }
        }

        // 2. Replace the doctor-day catalog
        let catalog = SlotCatalog::new(doctor_id.to_string(), date.to_string(), labels);
        self.db.upsert_slot_catalog(&catalog)?;

        tracing::info!(
            "Published {} slots for doctor {} on {}",
            catalog.labels.len(),
            doctor_id,
            date
        );
        Ok(catalog)
    }

    /// Catalog labels not claimed by a live booking, in catalog order.
    /// A doctor-day without a published catalog has no slots, which is an
    /// empty list rather than an error.
    pub fn list_available_slots(&self, doctor_id: &str, date: &str) -> BookingResult<Vec<String>> {
        let catalog = match self.db.get_slot_catalog(doctor_id, date)? {
            Some(catalog) => catalog,
            None => return Ok(Vec::new()),
        };

        let booked: HashSet<String> = self
            .db
            .list_booked_labels(doctor_id, date)?
            .into_iter()
            .collect();

        Ok(catalog
            .labels
            .into_iter()
            .filter(|label| !booked.contains(label))
            .collect())
    }

    /// Book a catalog slot for a patient. The existence check and the
    /// insert are one atomic step, so two patients racing for the same
    /// label cannot both succeed.
    pub fn book_slot(
        &self,
        doctor_id: &str,
        date: &str,
        label: &str,
        patient_id: &str,
    ) -> BookingResult<Appointment> {
        // 1. Shape checks
        if patient_id.trim().is_empty() {
            return Err(BookingError::Validation(
                "Patient ID must not be blank".into(),
            ));
        }
        if doctor_id.trim().is_empty() {
            return Err(BookingError::Validation("Doctor ID must not be blank".into()));
        }
        validate_date(date).map_err(BookingError::Validation)?;

        // 2. The label must come from the published catalog
        let in_catalog = self
            .db
            .get_slot_catalog(doctor_id, date)?
            .map(|catalog| catalog.contains(label))
            .unwrap_or(false);
        if !in_catalog {
            return Err(BookingError::InvalidSlot {
                doctor_id: doctor_id.to_string(),
                date: date.to_string(),
                label: label.to_string(),
            });
        }

        // 3. Claim the slot; the insert carries its own exclusivity check
        let appointment = Appointment::new(
            patient_id.to_string(),
            doctor_id.to_string(),
            date.to_string(),
            label.to_string(),
        );
        if !self.db.create_appointment_if_free(&appointment)? {
            tracing::warn!(
                "Booking lost: slot {} for doctor {} on {} already taken",
                label,
                doctor_id,
                date
            );
            return Err(BookingError::SlotConflict {
                doctor_id: doctor_id.to_string(),
                date: date.to_string(),
                label: label.to_string(),
            });
        }

        tracing::info!(
            "Booked slot {} for doctor {} on {} (appointment {})",
            label,
            doctor_id,
            date,
            appointment.id
        );
        Ok(appointment)
    }

    /// Cancel an appointment, freeing its slot. Releasing an appointment
    /// that is already cancelled changes nothing and is not an error.
    pub fn release_slot(&self, appointment_id: &str) -> BookingResult<Appointment> {
        let cancelled = self
            .db
            .cancel_appointment(appointment_id, &now_timestamp())?;

        match self.db.get_appointment(appointment_id)? {
            None => Err(BookingError::NotFound(appointment_id.to_string())),
            Some(appointment) => {
                if cancelled {
                    tracing::info!(
                        "Released slot {} for doctor {} on {} (appointment {})",
                        appointment.time_slot,
                        appointment.doctor_id,
                        appointment.date,
                        appointment.id
                    );
                }
                Ok(appointment)
            }
        }
    }

    /// Fetch one appointment, failing if it is unknown.
    pub fn get_appointment(&self, appointment_id: &str) -> BookingResult<Appointment> {
        self.db
            .get_appointment(appointment_id)?
            .ok_or_else(|| BookingError::NotFound(appointment_id.to_string()))
    }
}

fn validate_date(date: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Date must be YYYY-MM-DD, got: {date}"))
}
