//! Core data types shared across Bale crates.

pub mod manifest;

pub use manifest::PackageManifest;
