use std::sync::{Arc, Mutex};

use frontdesk::config::AppConfig;
use frontdesk::db;
use frontdesk::models::{AppointmentStatus, BusinessContext, SessionState, StatePatch, Turn};
use frontdesk::services::booking::BookingEngine;
use frontdesk::services::session::SessionManager;
use frontdesk::store::{SqliteCustomerStore, SqliteSessionStore, SqliteSlotStore};

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        database_url: ":memory:".to_string(),
        business_name: "Bella Salon".to_string(),
        business_phone: "+15551234567".to_string(),
        business_timezone: "America/New_York".to_string(),
        slot_duration_minutes: 60,
    }
}

fn test_business() -> BusinessContext {
    test_config().business_context()
}

fn test_stack() -> (Arc<BookingEngine>, SessionManager) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = test_config();
    let conn = db::init_db(&config.database_url).unwrap();
    let db = Arc::new(Mutex::new(conn));

    let engine = Arc::new(BookingEngine::new(
        Arc::new(SqliteSlotStore::new(Arc::clone(&db))),
        config.slot_duration_minutes,
    ));
    let manager = SessionManager::new(
        Arc::new(SqliteSessionStore::new(Arc::clone(&db))),
        Arc::new(SqliteCustomerStore::new(db)),
        config.business_context(),
    );
    (engine, manager)
}

fn customer_state(customer_id: &str) -> SessionState {
    SessionState {
        customer_id: customer_id.to_string(),
        phone_number: customer_id.to_string(),
        display_name: None,
        business: test_business(),
    }
}

// ── Booking scenario ──

#[tokio::test]
async fn test_booking_scenario_new_york() {
    let (engine, manager) = test_stack();

    let resolved = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    assert!(resolved.is_new);
    let state = resolved.session.state.clone();

    // First check: slot is free, a hold is created
    let first = engine
        .check_availability(&state, "haircut", "2025-03-10", "14:00")
        .await
        .unwrap();
    assert!(first.available);
    let hold_id = first.hold_id.clone().unwrap();

    // Second check for the same day/time: blocked by the hold
    let second = engine
        .check_availability(&customer_state("+15552220000"), "haircut", "2025-03-10", "14:00")
        .await
        .unwrap();
    assert!(!second.available);
    assert!(second.hold_id.is_none());

    // Confirm the hold
    assert!(engine.confirm(&hold_id, true).await.unwrap());

    // Lookup shows one confirmed appointment at the EDT-adjusted instant
    let lookup = engine.lookup("+15551110000").await.unwrap();
    assert!(lookup.found);
    assert_eq!(lookup.appointments.len(), 1);
    let appt = &lookup.appointments[0];
    assert_eq!(appt.id, hold_id);
    assert_eq!(appt.service, "haircut");
    assert_eq!(appt.status, AppointmentStatus::Confirmed);
    assert_eq!(appt.start_at.to_rfc3339(), "2025-03-10T18:00:00+00:00");
    assert_eq!(appt.end_at.to_rfc3339(), "2025-03-10T19:00:00+00:00");
}

#[tokio::test]
async fn test_concurrent_checks_yield_exactly_one_hold() {
    let (engine, _) = test_stack();

    let mut tasks = vec![];
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            let state = customer_state(&format!("+1555000{i:04}"));
            engine
                .check_availability(&state, "haircut", "2025-06-16", "10:00")
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for task in tasks {
        let outcome = task.await.unwrap();
        if outcome.available {
            winners += 1;
            assert!(outcome.hold_id.is_some());
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_half_open_boundary() {
    let (engine, _) = test_stack();
    let state = customer_state("+15551110000");

    let first = engine
        .check_availability(&state, "haircut", "2025-06-16", "10:00")
        .await
        .unwrap();
    assert!(first.available);

    // Starts exactly at the previous end: no conflict
    let adjacent = engine
        .check_availability(&state, "haircut", "2025-06-16", "11:00")
        .await
        .unwrap();
    assert!(adjacent.available);

    // One minute earlier overlaps
    let overlapping = engine
        .check_availability(&state, "haircut", "2025-06-16", "10:59")
        .await
        .unwrap();
    assert!(!overlapping.available);
}

#[tokio::test]
async fn test_lookup_is_idempotent() {
    let (engine, _) = test_stack();
    let state = customer_state("+15551110000");

    engine
        .check_availability(&state, "haircut", "2025-06-16", "10:00")
        .await
        .unwrap();
    engine
        .check_availability(&state, "coloring", "2025-06-17", "12:00")
        .await
        .unwrap();

    let first = engine.lookup("+15551110000").await.unwrap();
    let second = engine.lookup("+15551110000").await.unwrap();

    assert_eq!(first.found, second.found);
    let ids = |l: &frontdesk::services::booking::LookupOutcome| {
        l.appointments.iter().map(|a| a.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));

    let empty = engine.lookup("+15559990000").await.unwrap();
    assert!(!empty.found);
    assert!(empty.appointments.is_empty());
}

#[tokio::test]
async fn test_reschedule_flow() {
    let (engine, manager) = test_stack();

    let resolved = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    let state = &resolved.session.state;

    let hold_id = engine
        .check_availability(state, "haircut", "2025-06-16", "10:00")
        .await
        .unwrap()
        .hold_id
        .unwrap();
    engine.confirm(&hold_id, true).await.unwrap();

    let moved = engine
        .modify(&hold_id, Some("2025-06-17"), Some("15:00"), &state.business.timezone)
        .await
        .unwrap();
    assert!(moved.success);

    // The old slot is free again, the new one is blocked
    let old_slot = engine
        .check_availability(state, "haircut", "2025-06-16", "10:00")
        .await
        .unwrap();
    assert!(old_slot.available);

    let new_slot = engine
        .check_availability(state, "haircut", "2025-06-17", "15:00")
        .await
        .unwrap();
    assert!(!new_slot.available);
}

// ── Session lifecycle ──

#[tokio::test]
async fn test_session_resumption_and_end() {
    let (_, manager) = test_stack();

    let first = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    assert!(first.is_new);

    manager
        .append_turns(
            &first.session.id,
            vec![
                Turn {
                    role: "user".to_string(),
                    content: "I'd like a haircut tomorrow".to_string(),
                },
                Turn {
                    role: "model".to_string(),
                    content: "What time works for you?".to_string(),
                },
            ],
        )
        .await
        .unwrap();

    let resumed = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    assert!(!resumed.is_new);
    assert_eq!(resumed.session.id, first.session.id);
    assert_eq!(resumed.session.history.len(), 2);

    manager.end(&first.session.id).await.unwrap();

    let fresh = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    assert!(fresh.is_new);
    assert_ne!(fresh.session.id, first.session.id);
    assert!(fresh.session.history.is_empty());
}

#[tokio::test]
async fn test_learned_name_lands_on_bookings() {
    let (engine, manager) = test_stack();

    let resolved = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    manager
        .update_state(
            &resolved.session.id,
            StatePatch {
                display_name: Some("Alice".to_string()),
            },
        )
        .await
        .unwrap();

    // Re-resolve to pick up the merged state, then book
    let resumed = manager.resolve("+15551110000", "+15551110000").await.unwrap();
    let hold_id = engine
        .check_availability(&resumed.session.state, "haircut", "2025-06-16", "10:00")
        .await
        .unwrap()
        .hold_id
        .unwrap();
    engine.confirm(&hold_id, true).await.unwrap();

    let lookup = engine.lookup("+15551110000").await.unwrap();
    assert_eq!(lookup.appointments.len(), 1);

    // Two customers, separate sessions, no crosstalk
    let other = manager.resolve("+15552220000", "+15552220000").await.unwrap();
    assert!(other.is_new);
    assert_ne!(other.session.id, resumed.session.id);
    assert!(other.session.state.display_name.is_none());
}
