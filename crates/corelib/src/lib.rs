//! Core library for request-to-server mapping.
//!
//! This crate provides the two sharding strategies used to decide which
//! server owns an incoming key:
//! - Highest-Random-Weight (rendezvous) hashing
//! - Consistent hashing over a fixed-size ring with virtual nodes
//!
//! Both strategies are deterministic: the same pool and the same key always
//! resolve to the same server. Neither stores or forwards data; they only
//! answer the ownership question.

pub mod error;
pub mod hash;
pub mod hrw;
pub mod ring;
pub mod server;

pub use error::{Error, Result};
pub use hrw::HrwRing;
pub use ring::{ConsistentRing, Placement, RehashReport, RouteTarget};
pub use server::{Server, ServerKey};
