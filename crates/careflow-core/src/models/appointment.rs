//! Appointment and check-in token models.

use serde::{Deserialize, Serialize};

use super::now_timestamp;

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    /// Slot is held by this appointment
    Booked,
    /// Released; the slot is free again
    Cancelled,
}

impl AppointmentStatus {
    /// Storage/display form of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the storage form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(AppointmentStatus::Booked),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A confirmed booking of one slot for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    /// Patient reference (resolved by the external directory)
    pub patient_id: String,
    /// Doctor reference (resolved by the external directory)
    pub doctor_id: String,
    /// Calendar day, YYYY-MM-DD
    pub date: String,
    /// Slot label from the published catalog (e.g. "09:00")
    pub time_slot: String,
    /// Booking status
    pub status: AppointmentStatus,
    /// SHA-256 digest of the current check-in token, if one was issued
    pub checkin_token_digest: Option<String>,
    /// When the current check-in token stops being valid
    pub checkin_token_expires: Option<String>,
    /// Whether the current check-in token has been used
    pub checkin_token_consumed: bool,
    /// Creation timestamp
    pub created_at: String,
    /// Last mutation timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Create a fresh booking for a slot.
    pub fn new(patient_id: String, doctor_id: String, date: String, time_slot: String) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            date,
            time_slot,
            status: AppointmentStatus::Booked,
            checkin_token_digest: None,
            checkin_token_expires: None,
            checkin_token_consumed: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether this appointment still holds its slot.
    pub fn holds_slot(&self) -> bool {
        self.status == AppointmentStatus::Booked
    }

    /// The check-in token state, if one has been issued.
    pub fn checkin_token(&self) -> Option<CheckInToken> {
        Some(CheckInToken {
            appointment_id: self.id.clone(),
            token_digest: self.checkin_token_digest.clone()?,
            expires_at: self.checkin_token_expires.clone()?,
            consumed: self.checkin_token_consumed,
        })
    }
}

/// Check-in token state, stored on its appointment but modeled separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckInToken {
    /// Owning appointment
    pub appointment_id: String,
    /// SHA-256 digest of the opaque token value
    pub token_digest: String,
    /// Expiry instant; the token is unusable from this time on
    pub expires_at: String,
    /// Set once the token has been used at a kiosk
    pub consumed: bool,
}

/// Plaintext token handed to the caller at issuance. Only the digest is
/// stored; the value cannot be recovered later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssuedToken {
    /// Owning appointment
    pub appointment_id: String,
    /// Opaque token value to present at the kiosk
    pub token: String,
    /// Expiry instant
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_appointment() {
        let appt = Appointment::new(
            "patient-1".into(),
            "doctor-1".into(),
            "2026-09-01".into(),
            "09:00".into(),
        );
        assert_eq!(appt.id.len(), 36);
        assert_eq!(appt.status, AppointmentStatus::Booked);
        assert!(appt.holds_slot());
        assert!(appt.checkin_token().is_none());
        assert_eq!(appt.created_at, appt.updated_at);
    }

    #[test]
    fn test_checkin_token_view() {
        let mut appt = Appointment::new(
            "patient-1".into(),
            "doctor-1".into(),
            "2026-09-01".into(),
            "09:00".into(),
        );
        appt.checkin_token_digest = Some("d1".into());
        appt.checkin_token_expires = Some("2026-09-01T09:05:00.000Z".into());

        let token = appt.checkin_token().unwrap();
        assert_eq!(token.appointment_id, appt.id);
        assert_eq!(token.token_digest, "d1");
        assert!(!token.consumed);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(
            AppointmentStatus::parse(AppointmentStatus::Booked.as_str()),
            Some(AppointmentStatus::Booked)
        );
        assert_eq!(
            AppointmentStatus::parse(AppointmentStatus::Cancelled.as_str()),
            Some(AppointmentStatus::Cancelled)
        );
        assert_eq!(AppointmentStatus::parse("no_show"), None);
    }
}
