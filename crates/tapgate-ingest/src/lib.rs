//! Message ingestion pipeline.
//!
//! This crate wires the transport, protocol, and storage layers together:
//!
//! - [`MessageRouter`] — splits inbound topics into per-channel handlers
//!   and keeps device last-seen timestamps current
//! - [`AttendanceHandler`] — validates scans, persists attendance logs,
//!   and answers each device on its response topic
//! - [`ControlDispatcher`] / [`AckHandler`] — the two halves of the
//!   optimistic-then-confirmed device state flow
//! - [`IngestService`] — the event loop that drives everything off a
//!   [`MessageBus`](tapgate_bus::MessageBus)
//!
//! # Failure isolation
//!
//! The boundary of failure is a single inbound message. Malformed input
//! is dropped with a diagnostic; persistence failures roll back that
//! handler's transaction and suppress the response; nothing a single
//! message does can stop the service loop or affect another message.

pub mod attendance;
pub mod control;
pub mod error;
pub mod router;
pub mod service;

pub use attendance::AttendanceHandler;
pub use control::{AckHandler, ControlDispatcher, ControlOutcome};
pub use error::{IngestError, IngestResult};
pub use router::MessageRouter;
pub use service::IngestService;
