//! The ingestion service loop.
//!
//! Drives a [`MessageBus`] event stream: subscriptions are (re)established
//! on every connect event, inbound messages are routed with per-message
//! error isolation, and the loop only ends when the bus closes.

use tapgate_bus::{BusEvent, MessageBus};
use tapgate_protocol::topic::TopicFilter;
use tapgate_storage::Database;
use tracing::{debug, error, info, warn};

use crate::error::IngestResult;
use crate::router::MessageRouter;

/// Long-running ingestion service over one bus connection.
pub struct IngestService<B: MessageBus> {
    bus: B,
    router: MessageRouter<B>,
}

impl<B: MessageBus> IngestService<B> {
    /// Create a new ingestion service
    pub fn new(bus: B, db: Database) -> Self {
        let router = MessageRouter::new(bus.clone(), db);
        Self { bus, router }
    }

    /// Run the event loop until the bus closes.
    ///
    /// A failure handling one message is logged and does not stop the
    /// loop. Subscribing is idempotent, so it is simply re-run on every
    /// connect event rather than tracked as state.
    pub async fn run(&self) -> IngestResult<()> {
        while let Some(event) = self.bus.recv().await {
            match event {
                BusEvent::Connected => {
                    info!("Bus connected, establishing subscriptions");
                    self.subscribe_all().await;
                }
                BusEvent::Disconnected => {
                    warn!("Bus connection lost, awaiting reconnect");
                }
                BusEvent::SubscribeAck(filter) => {
                    debug!(filter = %filter.as_str(), "Subscription acknowledged");
                }
                BusEvent::Message(message) => {
                    if let Err(e) = self.router.route(&message).await {
                        error!(topic = %message.topic, error = %e, "Failed to handle message");
                    }
                }
            }
        }

        info!("Bus closed, ingestion service stopping");
        Ok(())
    }

    async fn subscribe_all(&self) {
        for filter in [TopicFilter::attendance(), TopicFilter::control_response()] {
            if let Err(e) = self.bus.subscribe(&filter).await {
                error!(filter = %filter.as_str(), error = %e, "Failed to subscribe");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapgate_bus::memory::{MemoryBroker, MemoryBus};
    use tapgate_core::{BadgeId, DeviceId};
    use tapgate_protocol::payloads::ScanResponse;
    use tapgate_storage::{
        AttendanceLogRepository, DeviceRepository, SqliteAttendanceLogRepository,
        SqliteDeviceRepository, User, transaction,
    };
    use tokio::time::{Duration, sleep};

    async fn seed_user(db: &Database, badge: &str) {
        let user = User {
            id: 0,
            full_name: "Alan Turing".to_string(),
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

    async fn start_service(broker: &MemoryBroker, db: Database) -> MemoryBus {
        let bus = broker.connect("ingest");
        let service = IngestService::new(bus.clone(), db);
        tokio::spawn(async move { service.run().await });
        // Let the service pick up the connect event and subscribe.
        sleep(Duration::from_millis(50)).await;
        bus
    }

    async fn publish_device(broker: &MemoryBroker, topic: &str, payload: Vec<u8>) {
        let device_bus = broker.connect("device");
        device_bus.publish(topic, payload).await.unwrap();
        sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_end_to_end_scan_through_service() {
        let broker = MemoryBroker::new();
        let db = Database::in_memory().await.unwrap();
        seed_user(&db, "04A1B2C3").await;

        // Device subscribes to its own response topic before the scan.
        let device_bus = broker.connect("gate-1");
        device_bus
            .subscribe(&TopicFilter::parse("esp32/gate-1/response").unwrap())
            .await
            .unwrap();

        start_service(&broker, db.clone()).await;

        let payload = serde_json::json!({
            "rfid_uid": "04A1B2C3",
            "timestamp": "2026-03-10T08:30:00Z",
        })
        .to_string()
        .into_bytes();
        device_bus
            .publish("esp32/gate-1/attendance", payload)
            .await
            .unwrap();

        let mut response = None;
        for _ in 0..20 {
            match tokio::time::timeout(Duration::from_millis(100), device_bus.recv()).await {
                Ok(Some(BusEvent::Message(msg))) => {
                    response = Some(ScanResponse::from_slice(&msg.payload).unwrap());
                    break;
                }
                Ok(Some(_)) => continue,
                _ => break,
            }
        }

        let response = response.expect("device should receive a scan response");
        assert!(response.is_success);
        assert_eq!(response.user_name.as_deref(), Some("Alan Turing"));

        let logs = SqliteAttendanceLogRepository::new(db.pool().clone());
        let rows = logs.find_recent(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_success());
    }

    #[tokio::test]
    async fn test_one_bad_message_does_not_stop_the_loop() {
        let broker = MemoryBroker::new();
        let db = Database::in_memory().await.unwrap();
        seed_user(&db, "04A1B2C3").await;

        start_service(&broker, db.clone()).await;

        publish_device(&broker, "esp32/gate-1/attendance", b"garbage".to_vec()).await;
        publish_device(
            &broker,
            "esp32/gate-1/attendance",
            serde_json::json!({
                "rfid_uid": "04A1B2C3",
                "timestamp": "2026-03-10T08:30:00Z",
            })
            .to_string()
            .into_bytes(),
        )
        .await;

        let logs = SqliteAttendanceLogRepository::new(db.pool().clone());
        assert_eq!(logs.find_recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resubscribes_after_reconnect() {
        let broker = MemoryBroker::new();
        let db = Database::in_memory().await.unwrap();

        start_service(&broker, db.clone()).await;

        // Drop every subscription, then simulate a reconnect cycle.
        broker.interrupt();
        sleep(Duration::from_millis(50)).await;

        publish_device(
            &broker,
            "esp32/gate-2/attendance",
            serde_json::json!({
                "rfid_uid": "DEADBEEF",
                "timestamp": "2026-03-10T09:00:00Z",
            })
            .to_string()
            .into_bytes(),
        )
        .await;

        // The scan still lands, so the re-subscription took effect.
        let logs = SqliteAttendanceLogRepository::new(db.pool().clone());
        let rows = logs
            .find_by_badge_and_range(
                &BadgeId::new("DEADBEEF").unwrap(),
                chrono::Utc::now() - chrono::Duration::days(365),
                chrono::Utc::now() + chrono::Duration::days(365),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_control_response_channel_reaches_ack_handler() {
        let broker = MemoryBroker::new();
        let db = Database::in_memory().await.unwrap();

        let devices = SqliteDeviceRepository::new(db.pool().clone());
        devices
            .get_or_create(&DeviceId::new("gate-1").unwrap())
            .await
            .unwrap();

        start_service(&broker, db.clone()).await;

        publish_device(
            &broker,
            "esp32/gate-1/control_response",
            serde_json::json!({ "command": "RFID_DISABLE", "status": "SUCCESS" })
                .to_string()
                .into_bytes(),
        )
        .await;

        let row = devices
            .find_by_device_id(&DeviceId::new("gate-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!row.rfid_enabled);
    }
}
