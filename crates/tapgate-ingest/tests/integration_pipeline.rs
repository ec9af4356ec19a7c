//! End-to-end pipeline tests over the in-memory bus
//!
//! Everything here goes through topics only: the test plays a device and
//! an admin, and observes effects through the database and the device's
//! own subscriptions.
//!
//! Run with: cargo test --package tapgate-ingest --test integration_pipeline

use tapgate_bus::memory::{MemoryBroker, MemoryBus};
use tapgate_bus::{BusEvent, BusMessage, MessageBus};
use tapgate_core::{ControlCommand, DeviceId, DoorState};
use tapgate_ingest::{ControlDispatcher, IngestService};
use tapgate_protocol::payloads::{ControlMessage, ScanResponse};
use tapgate_protocol::topic::{self, TopicFilter};
use tapgate_storage::{
    Database, DeviceRepository, SqliteDeviceRepository, User, transaction,
};
use tokio::time::{Duration, sleep, timeout};

async fn start_service(broker: &MemoryBroker, db: &Database) {
    let bus = broker.connect("server");
    let service = IngestService::new(bus, db.clone());
    tokio::spawn(async move { service.run().await });
    sleep(Duration::from_millis(50)).await;
}

async fn seed_user(db: &Database, badge: &str, full_name: &str) {
    let user = User {
        id: 0,
        full_name: full_name.to_string(),
        badge_uid: badge.to_string(),
        email: format!("{badge}@example.com"),
        password_hash: "hash".to_string(),
        is_active: true,
        is_admin: false,
        created_at: chrono::Utc::now(),
    };
    let mut tx = db.pool().begin().await.unwrap();
    transaction::create_user(&mut tx, &user).await.unwrap();
    tx.commit().await.unwrap();
}

async fn next_message(bus: &MemoryBus) -> Option<BusMessage> {
    loop {
        match timeout(Duration::from_millis(300), bus.recv()).await {
            Ok(Some(BusEvent::Message(msg))) => return Some(msg),
            Ok(Some(_)) => continue,
            _ => return None,
        }
    }
}

#[tokio::test]
async fn test_device_scan_and_response_over_topics_only() {
    let broker = MemoryBroker::new();
    let db = Database::in_memory().await.unwrap();
    seed_user(&db, "04A1B2C3", "Ada Lovelace").await;
    start_service(&broker, &db).await;

    let device_id = DeviceId::new("gate-7").unwrap();
    let device = broker.connect("gate-7");
    device
        .subscribe(&TopicFilter::parse(&topic::response_topic(&device_id)).unwrap())
        .await
        .unwrap();

    device
        .publish(
            &topic::attendance_topic(&device_id),
            serde_json::json!({
                "rfid_uid": "04A1B2C3",
                "timestamp": "2026-03-10T08:30:00Z",
            })
            .to_string()
            .into_bytes(),
        )
        .await
        .unwrap();

    let msg = next_message(&device).await.expect("response expected");
    let response = ScanResponse::from_slice(&msg.payload).unwrap();
    assert!(response.is_success);
    assert_eq!(response.user_name.as_deref(), Some("Ada Lovelace"));

    // The scan registered the device and stamped its last-seen time.
    let devices = SqliteDeviceRepository::new(db.pool().clone());
    let row = devices.find_by_device_id(&device_id).await.unwrap().unwrap();
    assert!(row.last_seen.is_some());
}

#[tokio::test]
async fn test_control_round_trip_with_ack() {
    let broker = MemoryBroker::new();
    let db = Database::in_memory().await.unwrap();
    start_service(&broker, &db).await;

    let device_id = DeviceId::new("gate-7").unwrap();
    let device = broker.connect("gate-7");
    device
        .subscribe(&TopicFilter::parse(&topic::control_topic(&device_id)).unwrap())
        .await
        .unwrap();

    let dispatcher = ControlDispatcher::new(broker.connect("admin"), db.clone());
    let outcome = dispatcher
        .dispatch(&device_id, ControlCommand::DoorOpen, 42)
        .await
        .unwrap();
    assert!(outcome.mqtt_published);
    assert_eq!(outcome.device.door().unwrap(), DoorState::Open);

    // The device hears the command and acknowledges it.
    let msg = next_message(&device).await.expect("command expected");
    let command = ControlMessage::from_slice(&msg.payload).unwrap();
    assert_eq!(command.command, ControlCommand::DoorOpen);
    assert_eq!(command.admin_id, 42);

    device
        .publish(
            &format!("esp32/{device_id}/control_response"),
            serde_json::json!({ "command": "DOOR_OPEN", "status": "SUCCESS" })
                .to_string()
                .into_bytes(),
        )
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    let devices = SqliteDeviceRepository::new(db.pool().clone());
    let row = devices.find_by_device_id(&device_id).await.unwrap().unwrap();
    assert_eq!(row.door().unwrap(), DoorState::Open);
}

#[tokio::test]
async fn test_malformed_topics_are_inert() {
    let broker = MemoryBroker::new();
    let db = Database::in_memory().await.unwrap();
    start_service(&broker, &db).await;

    let publisher = broker.connect("anything");
    for t in ["esp32/dev1", "wrong/dev1/attendance", "esp32/a/b/c"] {
        publisher.publish(t, b"{}".to_vec()).await.unwrap();
    }
    sleep(Duration::from_millis(50)).await;

    let devices = SqliteDeviceRepository::new(db.pool().clone());
    assert!(devices.list_all().await.unwrap().is_empty());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance_logs")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}
