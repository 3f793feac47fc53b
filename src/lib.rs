//! Waiting-list lottery core: entrant membership state machine, optimistic
//! transactions over a pluggable document store, and a seeded fair draw.
//!
//! # Examples
//!
//! Synchronous usage with [`persist::memory::MemoryEventStore`]:
//! ```
//! use std::sync::Arc;
//!
//! use eventdraw::{
//!     config::LotteryConfig,
//!     core::projection::DisplayStatus,
//!     event::EventDraft,
//!     persist::memory::MemoryEventStore,
//!     service::Lottery,
//! };
//!
//! let lottery = Lottery::new(Arc::new(MemoryEventStore::new()), LotteryConfig::default());
//! lottery.create_event(EventDraft {
//!     id: "swim-101".to_string(),
//!     title: "Swim lessons".to_string(),
//!     organizer_id: "org-1".to_string(),
//!     capacity: 2,
//!     register_window: None,
//! }).expect("create");
//!
//! for entrant in ["a", "b", "c"] {
//!     lottery.join("swim-101", entrant).expect("join");
//! }
//! let drawn = lottery.draw_winners_seeded("swim-101", 0, 7).expect("draw");
//! assert_eq!(drawn.winners.len(), 2);
//!
//! let status = lottery
//!     .project_status("swim-101", &drawn.winners[0], 0)
//!     .expect("project")
//!     .expect("participant");
//! assert_eq!(status.status, DisplayStatus::Selected);
//! ```
//!
//! Async usage with the SQLite store and the event stream:
//! ```no_run
//! use std::sync::Arc;
//!
//! use eventdraw::{
//!     config::LotteryConfig,
//!     persist::sqlite::SqliteEventStore,
//!     runtime::handle::spawn_lottery,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteEventStore::open("lottery.db").expect("open sqlite");
//! let handle = spawn_lottery(Arc::new(store), LotteryConfig::default());
//! let mut events = handle.subscribe();
//! handle.join("swim-101", "device-42").await.expect("join");
//! let _joined = events.recv().await.expect("event");
//! # }
//! ```
#![warn(missing_docs)]

/// Retry, validation, and channel settings.
pub mod config;
/// Membership model, draw engine, projection, and transaction loop.
pub mod core;
/// Caller-facing error type.
pub mod error;
/// Event record and settings types.
pub mod event;
/// Journaled transition model.
pub mod op;
/// Store adapter trait and implementations.
pub mod persist;
/// Async handle and lifecycle events.
pub mod runtime;
/// Synchronous operation facade.
pub mod service;
/// Shared primitive types and helpers.
pub mod types;
