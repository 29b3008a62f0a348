#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Networking: per-peer replication sessions and the TCP transport that feeds them.

pub mod p2p;
pub mod p2p_identity;
pub mod session;
