//! Seeded fast hashing for ring placement and weight computation.
//!
//! This is deliberately a different hash family than the identity digest in
//! [`crate::server`]: placement needs a cheap, uniformly distributed value
//! per `(bytes, seed)` pair, while the digest needs a canonical durable key.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Hashes a byte sequence under an integer seed.
///
/// Non-cryptographic. Used for virtual-node placement, key-to-ring targets,
/// and HRW weights; never as a server's durable identity.
#[inline]
pub fn fast_hash(bytes: &[u8], seed: u64) -> u64 {
    xxh3_64_with_seed(bytes, seed)
}
