//! Client for the bank backend that owns KYC requests.

pub mod client;
pub mod error;

pub use client::*;
pub use error::*;
