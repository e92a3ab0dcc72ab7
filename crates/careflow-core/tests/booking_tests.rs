//! Slot booking integration tests.

use careflow_core::booking::{BookingError, SlotAllocator};
use careflow_core::db::Database;
use careflow_core::models::AppointmentStatus;

const DOCTOR: &str = "doctor-1";
const DATE: &str = "2026-09-01";

fn setup_catalog(db: &Database) {
    SlotAllocator::new(db)
        .publish_catalog(DOCTOR, DATE, vec!["09:00".into(), "09:30".into()])
        .unwrap();
}

#[test]
fn test_two_slot_booking_scenario() {
    let db = Database::open_in_memory().unwrap();
    setup_catalog(&db);
    let allocator = SlotAllocator::new(&db);

    // P1 takes 09:00
    let first = allocator.book_slot(DOCTOR, DATE, "09:00", "P1").unwrap();
    assert_eq!(first.status, AppointmentStatus::Booked);
    assert_eq!(first.time_slot, "09:00");

    // P2 cannot have 09:00
    let err = allocator.book_slot(DOCTOR, DATE, "09:00", "P2").unwrap_err();
    assert!(matches!(err, BookingError::SlotConflict { .. }));

    // P2 takes 09:30; the day is now full
    allocator.book_slot(DOCTOR, DATE, "09:30", "P2").unwrap();
    assert!(allocator.list_available_slots(DOCTOR, DATE).unwrap().is_empty());
}

#[test]
fn test_unknown_label_is_invalid_not_conflict() {
    let db = Database::open_in_memory().unwrap();
    setup_catalog(&db);
    let allocator = SlotAllocator::new(&db);

    let err = allocator.book_slot(DOCTOR, DATE, "10:00", "P1").unwrap_err();
    assert!(matches!(err, BookingError::InvalidSlot { .. }));

    // Unpublished day
    let err = allocator
        .book_slot(DOCTOR, "2026-09-02", "09:00", "P1")
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidSlot { .. }));
}

#[test]
fn test_release_then_rebook() {
    let db = Database::open_in_memory().unwrap();
    setup_catalog(&db);
    let allocator = SlotAllocator::new(&db);

    let appointment = allocator.book_slot(DOCTOR, DATE, "09:00", "P1").unwrap();
    assert_eq!(
        allocator.list_available_slots(DOCTOR, DATE).unwrap(),
        vec!["09:30"]
    );

    allocator.release_slot(&appointment.id).unwrap();
    assert_eq!(
        allocator.list_available_slots(DOCTOR, DATE).unwrap(),
        vec!["09:00", "09:30"]
    );

    // Releasing again changes nothing
    let released = allocator.release_slot(&appointment.id).unwrap();
    assert_eq!(released.status, AppointmentStatus::Cancelled);

    let rebooked = allocator.book_slot(DOCTOR, DATE, "09:00", "P2").unwrap();
    assert_eq!(rebooked.patient_id, "P2");
}

#[test]
fn test_republish_does_not_disturb_bookings() {
    let db = Database::open_in_memory().unwrap();
    setup_catalog(&db);
    let allocator = SlotAllocator::new(&db);

    let appointment = allocator.book_slot(DOCTOR, DATE, "09:00", "P1").unwrap();

    // The afternoon replaces the morning in the catalog
    allocator
        .publish_catalog(DOCTOR, DATE, vec!["14:00".into(), "14:30".into()])
        .unwrap();

    // The booking stands even though its label left the catalog
    let stored = allocator.get_appointment(&appointment.id).unwrap();
    assert_eq!(stored.status, AppointmentStatus::Booked);

    // Available slots follow the new catalog
    assert_eq!(
        allocator.list_available_slots(DOCTOR, DATE).unwrap(),
        vec!["14:00", "14:30"]
    );

    // The withdrawn label can no longer be booked
    let err = allocator.book_slot(DOCTOR, DATE, "09:30", "P2").unwrap_err();
    assert!(matches!(err, BookingError::InvalidSlot { .. }));
}

#[test]
fn test_get_unknown_appointment() {
    let db = Database::open_in_memory().unwrap();
    let allocator = SlotAllocator::new(&db);
    let err = allocator.get_appointment("nope").unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[test]
fn test_concurrent_bookings_for_last_slot_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir
        .path()
        .join("careflow.db")
        .to_string_lossy()
        .into_owned();

    let db = Database::open(&path).unwrap();
    SlotAllocator::new(&db)
        .publish_catalog(DOCTOR, DATE, vec!["09:00".into()])
        .unwrap();
    drop(db);

    // Eight patients race for the one slot on separate connections
    let mut handles = Vec::new();
    for n in 0..8 {
        let path = path.clone();
        handles.push(std::thread::spawn(move || {
            let db = Database::open(&path).unwrap();
            let allocator = SlotAllocator::new(&db);
            allocator.book_slot(DOCTOR, DATE, "09:00", &format!("P{n}"))
        }));
    }

    let mut winners = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(appointment) => winners.push(appointment),
            Err(BookingError::SlotConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, 7);

    // Exactly one live appointment row exists for the slot
    let db = Database::open(&path).unwrap();
    let stored = SlotAllocator::new(&db)
        .get_appointment(&winners[0].id)
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Booked);
    assert!(SlotAllocator::new(&db)
        .list_available_slots(DOCTOR, DATE)
        .unwrap()
        .is_empty());
}
