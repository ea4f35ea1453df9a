//! KYC portal intake client.
//!
//! Acquires a QR payload from an uploaded image or a live camera, validates
//! it, and submits it to the bank backend; also hosts the request dashboard
//! commands used by bank staff.

pub mod controller;
pub mod dashboard;
pub mod decoder;
pub mod image_source;
pub mod notify;
pub mod qr_reader;

pub use controller::{AcquisitionMode, SubmissionController};
pub use notify::{ConsoleNotifier, Notifier, RecordingNotifier};
