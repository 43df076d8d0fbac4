//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Plain request/response contracts exchanged with the controller
//! - Cache partitions and settings with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, EntryMeta, PartitionSummary, PurgeFilter};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{CacheMode, Request, RequestMode, Response};
