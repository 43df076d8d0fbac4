//! Client code for shellcache.
//!
//! This crate provides the offline cache controller and the network layer it
//! fetches through, shared by the server and CLI.

pub mod controller;
pub mod fetch;

pub use controller::{Controller, ControllerConfig, FetchOutcome, InstallReport, Phase, ResponseSource};

pub use fetch::{FetchConfig, HttpNetwork, Network, UrlError, canonicalize, resolve};
