//! Appointment database operations.
//!
//! Slot exclusivity and token consumption are both enforced here as
//! single-statement conditional writes; the partial unique index in the
//! schema backstops the booking path.

use rusqlite::{params, ErrorCode, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus};

impl Database {
    /// Create the appointment only if no live booking holds its
    /// (doctor, day, label) slot. Returns whether the row was created.
    pub fn create_appointment_if_free(&self, appt: &Appointment) -> DbResult<bool> {
        let result = self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, doctor_id, slot_date, time_slot,
                status, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7
            WHERE NOT EXISTS (
                SELECT 1 FROM appointments
                WHERE doctor_id = ?3 AND slot_date = ?4 AND time_slot = ?5
                  AND status != 'cancelled'
            )
            "#,
            params![
                appt.id,
                appt.patient_id,
                appt.doctor_id,
                appt.date,
                appt.time_slot,
                appt.status.as_str(),
                appt.created_at,
            ],
        );

        match result {
            Ok(rows_affected) => Ok(rows_affected > 0),
            // A writer that slipped between our probe and insert trips the
            // unique index instead; same outcome, slot taken.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, doctor_id, slot_date, time_slot, status,
                       checkin_token_digest, checkin_token_expires,
                       checkin_token_consumed, created_at, updated_at
                FROM appointments
                WHERE id = ?
                "#,
                [id],
                map_appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Cancel an appointment, freeing its slot. Returns whether a live
    /// booking was actually cancelled; cancelling again changes nothing.
    pub fn cancel_appointment(&self, id: &str, updated_at: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET status = 'cancelled', updated_at = ?2
            WHERE id = ?1 AND status != 'cancelled'
            "#,
            params![id, updated_at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Labels held by live bookings for one doctor-day.
    pub fn list_booked_labels(&self, doctor_id: &str, date: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT time_slot FROM appointments
            WHERE doctor_id = ?1 AND slot_date = ?2 AND status != 'cancelled'
            "#,
        )?;
        let rows = stmt.query_map(params![doctor_id, date], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Overwrite the check-in token fields, clearing the consumed flag.
    /// Last writer wins; any prior token digest is gone after this.
    /// Returns whether the appointment exists.
    pub fn set_checkin_token(
        &self,
        appointment_id: &str,
        token_digest: &str,
        expires_at: &str,
        updated_at: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                checkin_token_digest = ?2,
                checkin_token_expires = ?3,
                checkin_token_consumed = 0,
                updated_at = ?4
            WHERE id = ?1
            "#,
            params![appointment_id, token_digest, expires_at, updated_at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark the token consumed, but only if the digest matches, it has not
    /// been consumed, and it has not expired at `now`. The whole check and
    /// the flag write are one statement, so of two racing kiosks at most
    /// one sees `true`.
    pub fn consume_checkin_token(
        &self,
        appointment_id: &str,
        token_digest: &str,
        now: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                checkin_token_consumed = 1,
                updated_at = ?3
            WHERE id = ?1
              AND checkin_token_digest = ?2
              AND checkin_token_consumed = 0
              AND checkin_token_expires > ?3
            "#,
            params![appointment_id, token_digest, now],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    slot_date: String,
    time_slot: String,
    status: String,
    checkin_token_digest: Option<String>,
    checkin_token_expires: Option<String>,
    checkin_token_consumed: bool,
    created_at: String,
    updated_at: String,
}

fn map_appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        slot_date: row.get(3)?,
        time_slot: row.get(4)?,
        status: row.get(5)?,
        checkin_token_digest: row.get(6)?,
        checkin_token_expires: row.get(7)?,
        checkin_token_consumed: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown appointment status: {}", row.status))
        })?;

        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date: row.slot_date,
            time_slot: row.time_slot,
            status,
            checkin_token_digest: row.checkin_token_digest,
            checkin_token_expires: row.checkin_token_expires,
            checkin_token_consumed: row.checkin_token_consumed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_appt(patient: &str, label: &str) -> Appointment {
        Appointment::new(
            patient.into(),
            "doctor-1".into(),
            "2026-09-01".into(),
            label.into(),
        )
    }

    #[test]
    fn test_create_and_get() {
        let db = setup_db();
        let appt = make_appt("patient-1", "09:00");

        assert!(db.create_appointment_if_free(&appt).unwrap());

        let stored = db.get_appointment(&appt.id).unwrap().unwrap();
        assert_eq!(stored.patient_id, "patient-1");
        assert_eq!(stored.time_slot, "09:00");
        assert_eq!(stored.status, AppointmentStatus::Booked);
        assert!(!stored.checkin_token_consumed);
    }

    #[test]
    fn test_second_booking_for_same_slot_is_refused() {
        let db = setup_db();
        assert!(db.create_appointment_if_free(&make_appt("patient-1", "09:00")).unwrap());
        assert!(!db.create_appointment_if_free(&make_appt("patient-2", "09:00")).unwrap());

        // A different label is independent
        assert!(db.create_appointment_if_free(&make_appt("patient-2", "09:30")).unwrap());
    }

    #[test]
    fn test_cancelled_slot_can_be_rebooked() {
        let db = setup_db();
        let first = make_appt("patient-1", "09:00");
        db.create_appointment_if_free(&first).unwrap();

        assert!(db.cancel_appointment(&first.id, "2026-08-01T10:00:00.000Z").unwrap());
        // Second cancel is a no-op
        assert!(!db.cancel_appointment(&first.id, "2026-08-01T10:01:00.000Z").unwrap());

        assert!(db.create_appointment_if_free(&make_appt("patient-2", "09:00")).unwrap());
    }

    #[test]
    fn test_booked_labels() {
        let db = setup_db();
        db.create_appointment_if_free(&make_appt("patient-1", "09:00")).unwrap();
        let second = make_appt("patient-2", "09:30");
        db.create_appointment_if_free(&second).unwrap();
        db.cancel_appointment(&second.id, "2026-08-01T10:00:00.000Z").unwrap();

        let labels = db.list_booked_labels("doctor-1", "2026-09-01").unwrap();
        assert_eq!(labels, vec!["09:00"]);
    }

    #[test]
    fn test_set_token_overwrites_and_resets_consumed() {
        let db = setup_db();
        let appt = make_appt("patient-1", "09:00");
        db.create_appointment_if_free(&appt).unwrap();

        assert!(db
            .set_checkin_token(&appt.id, "digest-1", "2026-09-01T09:05:00.000Z", "2026-09-01T09:00:00.000Z")
            .unwrap());
        assert!(db
            .consume_checkin_token(&appt.id, "digest-1", "2026-09-01T09:01:00.000Z")
            .unwrap());

        // Re-issue clears the consumed flag and replaces the digest
        assert!(db
            .set_checkin_token(&appt.id, "digest-2", "2026-09-01T09:10:00.000Z", "2026-09-01T09:02:00.000Z")
            .unwrap());
        let stored = db.get_appointment(&appt.id).unwrap().unwrap();
        assert_eq!(stored.checkin_token_digest.as_deref(), Some("digest-2"));
        assert!(!stored.checkin_token_consumed);

        // Unknown appointment
        assert!(!db
            .set_checkin_token("nope", "digest", "2026-09-01T09:05:00.000Z", "2026-09-01T09:00:00.000Z")
            .unwrap());
    }

    #[test]
    fn test_consume_conditions() {
        let db = setup_db();
        let appt = make_appt("patient-1", "09:00");
        db.create_appointment_if_free(&appt).unwrap();
        db.set_checkin_token(&appt.id, "digest-1", "2026-09-01T09:05:00.000Z", "2026-09-01T09:00:00.000Z")
            .unwrap();

        // Wrong digest
        assert!(!db
            .consume_checkin_token(&appt.id, "other", "2026-09-01T09:01:00.000Z")
            .unwrap());
        // At expiry instant the token is already unusable
        assert!(!db
            .consume_checkin_token(&appt.id, "digest-1", "2026-09-01T09:05:00.000Z")
            .unwrap());
        // In the window it consumes exactly once
        assert!(db
            .consume_checkin_token(&appt.id, "digest-1", "2026-09-01T09:01:00.000Z")
            .unwrap());
        assert!(!db
            .consume_checkin_token(&appt.id, "digest-1", "2026-09-01T09:01:30.000Z")
            .unwrap());
    }
}
