#![forbid(unsafe_code)]

//! Core protocol primitives: blocks, the chain store, and node configuration.

/// Block hashing and validity.
pub mod block;
/// Chain store and local mutation driver.
pub mod chain;
/// Node configuration.
pub mod config;
/// Block record and wire codec.
pub mod types;
