//! # bale-core
//!
//! Core types and utilities shared across all Bale crates.
//!
//! This crate provides:
//! - PackageManifest and related types for package publishing
//! - BaleError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (PackageManifest, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{BaleError, BaleResult};
pub use types::PackageManifest;
