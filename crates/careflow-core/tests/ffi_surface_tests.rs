//! End-to-end tests through the exported FFI surface.

use careflow_core::{open_database_in_memory, CareflowError};

#[test]
fn test_incident_flow_over_ffi() {
    let core = open_database_in_memory().unwrap();

    let incident = core
        .report_incident(
            "12 Harbor St".into(),
            "+1-555-0100".into(),
            "chest pain".into(),
        )
        .unwrap();
    assert_eq!(incident.status, "reported");
    assert_eq!(incident.display_number, "INC-000001");

    let dispatched = core
        .assign_dispatch(incident.id.clone(), "D1".into(), "A1".into())
        .unwrap();
    assert_eq!(dispatched.status, "dispatched");
    assert!(core.list_er_incoming().unwrap().is_empty());

    let transporting = core.record_transport_start(incident.id.clone()).unwrap();
    assert_eq!(transporting.status, "transporting");
    assert!(transporting.transport_started_at.is_some());

    let incoming = core.list_er_incoming().unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].id, incident.id);

    let arrived = core.record_arrival(incident.id.clone()).unwrap();
    assert_eq!(arrived.status, "arrived");

    let closed = core.close_incident(incident.id.clone()).unwrap();
    assert_eq!(closed.status, "closed");
    assert!(core.list_dispatch_board().unwrap().is_empty());
}

#[test]
fn test_booking_and_checkin_over_ffi() {
    let core = open_database_in_memory().unwrap();

    core.publish_slot_catalog(
        "doctor-1".into(),
        "2026-09-01".into(),
        vec!["09:00".into(), "09:30".into()],
    )
    .unwrap();
    assert_eq!(
        core.list_available_slots("doctor-1".into(), "2026-09-01".into())
            .unwrap(),
        vec!["09:00", "09:30"]
    );

    let appointment = core
        .book_slot(
            "doctor-1".into(),
            "2026-09-01".into(),
            "09:00".into(),
            "P1".into(),
        )
        .unwrap();
    assert_eq!(appointment.status, "booked");
    // The digest never crosses the boundary; only the expiry is visible
    assert!(appointment.checkin_token_expires.is_none());

    let issued = core.issue_checkin_token(appointment.id.clone()).unwrap();
    assert_eq!(issued.appointment_id, appointment.id);
    assert_eq!(issued.token.len(), 64);

    core.validate_checkin_token(appointment.id.clone(), issued.token.clone())
        .unwrap();

    let released = core.release_slot(appointment.id.clone()).unwrap();
    assert_eq!(released.status, "cancelled");
    // Idempotent over FFI too
    core.release_slot(appointment.id).unwrap();
}

#[test]
fn test_directory_over_ffi() {
    let core = open_database_in_memory().unwrap();

    assert!(core
        .resolve_ref("ambulance".into(), "A1".into())
        .unwrap()
        .is_none());

    core.upsert_directory_entry(
        "ambulance".into(),
        "A1".into(),
        "Unit 1".into(),
        Some("Advanced life support".into()),
    )
    .unwrap();

    let summary = core
        .resolve_ref("ambulance".into(), "A1".into())
        .unwrap()
        .unwrap();
    assert_eq!(summary.kind, "ambulance");
    assert_eq!(summary.display_name, "Unit 1");

    let err = core
        .resolve_ref("starship".into(), "A1".into())
        .unwrap_err();
    assert!(matches!(err, CareflowError::ValidationError(_)));
}

#[test]
fn test_error_codes_stay_stable() {
    let core = open_database_in_memory().unwrap();

    // ValidationError
    let err = core
        .report_incident("".into(), "+1-555-0100".into(), "fall".into())
        .unwrap_err();
    assert!(matches!(err, CareflowError::ValidationError(_)));

    // NotFound
    let err = core.get_incident("nope".into()).unwrap_err();
    assert!(matches!(err, CareflowError::NotFound(_)));

    let incident = core
        .report_incident(
            "12 Harbor St".into(),
            "+1-555-0100".into(),
            "chest pain".into(),
        )
        .unwrap();
    core.assign_dispatch(incident.id.clone(), "D1".into(), "A1".into())
        .unwrap();

    // Conflict: a second assignment presumes a pre-dispatch snapshot
    let err = core
        .assign_dispatch(incident.id.clone(), "D2".into(), "A2".into())
        .unwrap_err();
    assert!(matches!(err, CareflowError::Conflict(_)));

    // IllegalTransition: cancelling after arrival
    core.record_transport_start(incident.id.clone()).unwrap();
    core.record_arrival(incident.id.clone()).unwrap();
    let err = core
        .cancel_incident(incident.id.clone(), "too late".into())
        .unwrap_err();
    assert!(matches!(err, CareflowError::IllegalTransition(_)));

    core.publish_slot_catalog("doctor-1".into(), "2026-09-01".into(), vec!["09:00".into()])
        .unwrap();
    let appointment = core
        .book_slot(
            "doctor-1".into(),
            "2026-09-01".into(),
            "09:00".into(),
            "P1".into(),
        )
        .unwrap();

    // InvalidSlot vs SlotConflict
    let err = core
        .book_slot(
            "doctor-1".into(),
            "2026-09-01".into(),
            "10:00".into(),
            "P2".into(),
        )
        .unwrap_err();
    assert!(matches!(err, CareflowError::InvalidSlot(_)));
    let err = core
        .book_slot(
            "doctor-1".into(),
            "2026-09-01".into(),
            "09:00".into(),
            "P2".into(),
        )
        .unwrap_err();
    assert!(matches!(err, CareflowError::SlotConflict(_)));

    // Mismatch, then AlreadyConsumed
    let issued = core.issue_checkin_token(appointment.id.clone()).unwrap();
    let err = core
        .validate_checkin_token(appointment.id.clone(), "wrong-token".into())
        .unwrap_err();
    assert!(matches!(err, CareflowError::Mismatch(_)));
    core.validate_checkin_token(appointment.id.clone(), issued.token.clone())
        .unwrap();
    let err = core
        .validate_checkin_token(appointment.id, issued.token)
        .unwrap_err();
    assert!(matches!(err, CareflowError::AlreadyConsumed(_)));
}
