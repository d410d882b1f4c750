//! Error types for the core library.

use crate::server::ServerKey;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// All variants are precondition violations surfaced directly to the caller;
/// there is no I/O to retry and no fallback server is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Route requested against an HRW pool with no servers.
    #[error("server pool is empty")]
    EmptyPool,
    /// Route requested against a ring with no occupied positions.
    #[error("ring has no occupied positions")]
    EmptyRing,
    /// Distribution report requested before any key was routed.
    #[error("no keys have been routed yet")]
    NoDataRouted,
    /// Removal of an identity the ring does not know.
    #[error("server {0} is not on the ring")]
    ServerNotFound(ServerKey),
    /// Addition of an identity the ring already holds.
    #[error("server {0} is already on the ring")]
    ServerAlreadyPresent(ServerKey),
    /// Placement probing could not find a free position.
    #[error("ring of size {size} is saturated")]
    RingSaturated { size: u64 },
    /// Rejected ring parameters (zero size or zero virtual nodes).
    #[error("invalid ring configuration: {0}")]
    InvalidConfig(String),
}
