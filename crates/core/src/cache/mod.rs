//! SQLite-backed cache partitions and settings.
//!
//! This module provides the durable storage behind the controller using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named partitions of captured responses keyed by absolute URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Purge by partition, host, or age
//! - A small key-value settings table outside the partitions

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod settings;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{EntryMeta, PurgeFilter};
pub use partitions::PartitionSummary;

/// Timestamp format shared by every table; fixed-width UTC so text order is time order.
pub(crate) fn now() -> String {
    timestamp(chrono::Utc::now())
}

pub(crate) fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
