//! The shared chain and the local input path that extends it.

pub mod driver;
pub mod store;
