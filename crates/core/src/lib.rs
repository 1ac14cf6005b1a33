//! Core types and configuration for the tickparse system.
//!
//! This crate provides shared types used across all other crates:
//! - The unified trade/quote record and its flat table row
//! - Semantic type conversion helpers (dates, timestamps, integers, decimals)
//! - The exact `decimal(30,15)` price type
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod convert;
pub mod error;
pub mod price;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use price::Price;
pub use types::*;
