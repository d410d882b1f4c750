//! Server identity records and their durable digest keys.
//!
//! Servers are passive data: the core never connects to them, it only
//! derives hash values from their identity. Bookkeeping (counters, ring
//! placements, removal) is keyed by [`ServerKey`], a digest of the identity,
//! so a server can be found again across process runs and regardless of
//! where its virtual nodes landed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity record for one server in the pool.
///
/// Kept small and cheap to clone; live connection state belongs elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Human-readable name.
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// Digest key for this server's identity.
    pub fn key(&self) -> ServerKey {
        ServerKey::of(self)
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.host, self.port)
    }
}

/// Stable hex digest of a server identity.
///
/// Equal identities always produce equal keys, across processes and runs.
/// This is the durable handle used for counters, `position -> server`
/// bookkeeping, and add/remove by identity. It is not the placement hash;
/// see [`crate::hash::fast_hash`] for that.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerKey {
    hex: String,
    seed: u64,
}

impl ServerKey {
    /// Digests a server's identity fields.
    ///
    /// Fields are fed to the hasher with separators so that e.g.
    /// ("ab", "c") and ("a", "bc") cannot collide structurally.
    pub fn of(server: &Server) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(server.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(server.host.as_bytes());
        hasher.update(&[0]);
        hasher.update(&server.port.to_be_bytes());
        let digest = hasher.finalize();
        let bytes = digest.as_bytes();
        let mut head = [0u8; 8];
        head.copy_from_slice(&bytes[..8]);
        Self {
            hex: digest.to_hex().to_string(),
            seed: u64::from_le_bytes(head),
        }
    }

    /// The full hex digest.
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Integer seed derived from the digest's leading bytes, for use where
    /// the fast hash needs a per-server seed (HRW weights).
    #[inline]
    pub fn placement_seed(&self) -> u64 {
        self.seed
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated digest reads better in logs; full value via as_hex().
        write!(f, "{}", &self.hex[..16])
    }
}
