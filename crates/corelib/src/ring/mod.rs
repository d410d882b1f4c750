//! Consistent hash ring implementation.
//!
//! The ring manages virtual-node positions on a fixed modulus and provides
//! the clockwise-walk lookup that finds the owning server (and its replica)
//! for a key.

pub mod ring;

pub use ring::{ConsistentRing, Placement, RehashMove, RehashReport, RouteTarget};
