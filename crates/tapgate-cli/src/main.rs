//! Loopback demonstration of the full attendance pipeline.
//!
//! Runs the ingestion service against the in-memory bus, plays the role
//! of one device for a simulated work day, and prints the resulting
//! attendance rows and work-day summary. Useful for smoke-testing the
//! stack end to end without a broker or hardware.

mod config;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use tapgate_bus::memory::MemoryBroker;
use tapgate_bus::{BusEvent, MessageBus};
use tapgate_core::{BadgeId, ControlCommand, DeviceId, ScanSource};
use tapgate_ingest::{ControlDispatcher, IngestService};
use tapgate_protocol::payloads::{ScanMessage, ScanResponse};
use tapgate_protocol::topic::{self, TopicFilter};
use tapgate_report::WorkDayReporter;
use tapgate_storage::{
    AttendanceLogRepository, Database, DatabaseConfig, SqliteAttendanceLogRepository,
    SqliteUserRepository, User, UserRepository,
};
use tokio::time::{Duration, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_BADGE: &str = "04A1B2C3";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::from_env();
    info!(database = %config.database_path, device = %config.demo_device, "Starting tapgate demo");

    let db = Database::new(DatabaseConfig::new(config.database_path.as_str()))
        .await
        .context("failed to open database")?;

    let badge = BadgeId::new(DEMO_BADGE)?;
    seed_demo_user(&db, &badge).await?;

    let broker = MemoryBroker::new();
    let server_bus = broker.connect("server");
    let service = IngestService::new(server_bus.clone(), db.clone());
    tokio::spawn(async move { service.run().await });
    sleep(Duration::from_millis(50)).await;

    let device_id = DeviceId::new(&config.demo_device)?;
    let device_bus = broker.connect(device_id.as_str());
    device_bus
        .subscribe(&TopicFilter::parse(&topic::response_topic(&device_id))?)
        .await?;

    // Morning scan in, evening scan out.
    let now = Utc::now();
    for event_time in [now - ChronoDuration::hours(9), now] {
        let scan = ScanMessage {
            rfid_uid: DEMO_BADGE.to_string(),
            timestamp: event_time.to_rfc3339(),
            code: ScanSource::Realtime,
        };
        device_bus
            .publish(&topic::attendance_topic(&device_id), scan.to_vec())
            .await?;
    }
    sleep(Duration::from_millis(100)).await;

    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(100), device_bus.recv()).await
    {
        if let BusEvent::Message(msg) = event {
            let response = ScanResponse::from_slice(&msg.payload)?;
            println!(
                "device <- {}: success={} user={:?} error={:?}",
                msg.topic, response.is_success, response.user_name, response.error_code
            );
        }
    }

    // Admin opens the door; state is optimistic until the device acks.
    let dispatcher = ControlDispatcher::new(server_bus, db.clone());
    let outcome = dispatcher
        .dispatch(&device_id, ControlCommand::DoorOpen, 1)
        .await?;
    println!(
        "control: door={} published={}",
        outcome.device.door_state, outcome.mqtt_published
    );

    let logs = SqliteAttendanceLogRepository::new(db.pool().clone());
    println!("\nrecent attendance:");
    for row in logs.find_recent(10).await? {
        println!(
            "  {} {} {} {}",
            row.timestamp,
            row.badge_uid,
            row.device_id,
            row.error_code.as_deref().unwrap_or("SUCCESS")
        );
    }

    let reporter = WorkDayReporter::new(&db);
    let summary = reporter.aggregate(now.date_naive(), &badge).await?;
    println!("\nwork day {}:", now.date_naive());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    Ok(())
}

async fn seed_demo_user(db: &Database, badge: &BadgeId) -> Result<()> {
    let users = SqliteUserRepository::new(db.pool().clone());
    if users.find_by_badge(badge).await?.is_some() {
        return Ok(());
    }

    let user = User {
        id: 0,
        full_name: "Demo User".to_string(),
        badge_uid: badge.as_str().to_string(),
        email: "demo@example.com".to_string(),
        password_hash: "unused".to_string(),
        is_active: true,
        is_admin: true,
        created_at: Utc::now(),
    };
    users.create(&user).await.context("failed to seed demo user")?;
    info!(badge = %badge, "Seeded demo user");
    Ok(())
}
