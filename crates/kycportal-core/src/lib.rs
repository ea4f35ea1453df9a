//! Core domain logic for the KYC portal client.
//!
//! This crate provides:
//! - Domain types shared with the backend (`types` module)
//! - QR payload validation (`payload` module)
//! - The intake session state machine (`session` module)
//! - Pipeline error taxonomy (`error` module)
//! - Display helpers and row actions for the dashboard (`display` module)
//!
//! With the `persistence` feature enabled:
//! - Configuration management (`config` module)

pub mod display;
pub mod error;
pub mod payload;
pub mod session;
pub mod types;

#[cfg(feature = "persistence")]
pub mod config;

pub use display::*;
pub use error::*;
pub use payload::*;
pub use session::*;
pub use types::*;

#[cfg(feature = "persistence")]
pub use config::{AppConfig, ConfigError};
