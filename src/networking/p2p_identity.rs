#![forbid(unsafe_code)]

//! Node identity: an Ed25519 keypair and its `PeerId`, used to name the node in logs.

use libp2p::{identity, PeerId};
use ring::digest;
use thiserror::Error;

const SEED_DOMAIN: &[u8] = b"pulsechain-identity-v1";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity key decode")]
    Decode,
}

/// Derive the node identity.
///
/// `seed == 0` yields a fresh random key; any other seed yields the same key on every run.
pub fn node_identity(seed: u64) -> Result<(PeerId, identity::Keypair), IdentityError> {
    let kp = if seed == 0 {
        identity::Keypair::generate_ed25519()
    } else {
        let mut buf = Vec::with_capacity(SEED_DOMAIN.len() + 8);
        buf.extend_from_slice(SEED_DOMAIN);
        buf.extend_from_slice(&seed.to_be_bytes());
        let d = digest::digest(&digest::SHA256, &buf);
        let mut secret = [0u8; 32];
        secret.copy_from_slice(d.as_ref());
        identity::Keypair::ed25519_from_bytes(secret).map_err(|_| IdentityError::Decode)?
    };
    let pid = PeerId::from(kp.public());
    Ok((pid, kp))
}
