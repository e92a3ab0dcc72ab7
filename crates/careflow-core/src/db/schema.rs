//! SQLite schema definition.

/// Complete database schema for careflow.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Incidents
-- ============================================================================

CREATE TABLE IF NOT EXISTS incidents (
    id TEXT PRIMARY KEY,
    incident_number INTEGER NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'reported'
        CHECK (status IN ('reported', 'dispatched', 'transporting', 'arrived', 'closed', 'cancelled')),
    location TEXT NOT NULL,
    reporter_contact TEXT NOT NULL,
    nature TEXT NOT NULL,
    dispatcher_id TEXT,
    ambulance_id TEXT,
    reported_at TEXT NOT NULL,
    transport_started_at TEXT,
    arrived_at TEXT,
    cancel_reason TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Dispatch assignment is written once and never changed or cleared
CREATE TRIGGER IF NOT EXISTS incidents_dispatcher_immutable BEFORE UPDATE ON incidents
WHEN old.dispatcher_id IS NOT NULL AND new.dispatcher_id IS NOT old.dispatcher_id
BEGIN
    SELECT RAISE(ABORT, 'dispatcher_id cannot be changed once set');
END;

CREATE TRIGGER IF NOT EXISTS incidents_ambulance_immutable BEFORE UPDATE ON incidents
WHEN old.ambulance_id IS NOT NULL AND new.ambulance_id IS NOT old.ambulance_id
BEGIN
    SELECT RAISE(ABORT, 'ambulance_id cannot be changed once set');
END;

CREATE INDEX IF NOT EXISTS idx_incidents_status ON incidents(status);
CREATE INDEX IF NOT EXISTS idx_incidents_reported_at ON incidents(reported_at);
CREATE INDEX IF NOT EXISTS idx_incidents_transport ON incidents(transport_started_at);

-- ============================================================================
-- Slot Catalogs
-- ============================================================================

CREATE TABLE IF NOT EXISTS slot_catalogs (
    doctor_id TEXT NOT NULL,
    slot_date TEXT NOT NULL,
    labels TEXT NOT NULL DEFAULT '[]',            -- JSON array, publication order
    published_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (doctor_id, slot_date)
);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    doctor_id TEXT NOT NULL,
    slot_date TEXT NOT NULL,
    time_slot TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'booked'
        CHECK (status IN ('booked', 'cancelled')),
    checkin_token_digest TEXT,
    checkin_token_expires TEXT,
    checkin_token_consumed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Slot exclusivity: at most one live booking per (doctor, day, label)
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot
    ON appointments(doctor_id, slot_date, time_slot)
    WHERE status != 'cancelled';

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor_day ON appointments(doctor_id, slot_date);

-- ============================================================================
-- Directory Cache
-- ============================================================================

CREATE TABLE IF NOT EXISTS directory_entries (
    kind TEXT NOT NULL
        CHECK (kind IN ('doctor', 'patient', 'dispatcher', 'ambulance')),
    id TEXT NOT NULL,
    display_name TEXT NOT NULL,
    detail TEXT,
    last_synced TEXT,
    PRIMARY KEY (kind, id)
);
"#;
