//! Highest-Random-Weight (rendezvous) hashing.
//!
//! Every lookup scores each server with `fast_hash(key, server seed)` and
//! picks the maximum. There is no shared ring structure to maintain, so the
//! pool handles churn trivially (weights are recomputed fresh on every
//! call), at the cost of O(servers) per lookup versus O(log positions) for
//! the ring walk.

use tracing::trace;

use crate::error::{Error, Result};
use crate::hash::fast_hash;
use crate::server::{Server, ServerKey};

/// HRW server pool with per-server routing counters.
///
/// The pool is fixed at construction; only the counters mutate, as part of
/// the [`route`](HrwRing::route) contract. Counter sum always equals
/// `total_routed`.
#[derive(Debug, Clone)]
pub struct HrwRing {
    servers: Vec<Server>,
    /// Identity digests, parallel to `servers`, computed once.
    keys: Vec<ServerKey>,
    /// Assignment counts per pool slot, parallel to `servers`. Keyed by
    /// slot rather than digest so a pool that lists the same identity
    /// twice still counts each routed key exactly once.
    assigned: Vec<u64>,
    total_routed: u64,
}

impl HrwRing {
    /// Builds a pool over the given servers, in the given order.
    ///
    /// Order matters: it is the tie-break for equal weights.
    pub fn new(servers: Vec<Server>) -> Self {
        let keys: Vec<ServerKey> = servers.iter().map(Server::key).collect();
        let assigned = vec![0; servers.len()];
        Self {
            servers,
            keys,
            assigned,
            total_routed: 0,
        }
    }

    /// Picks the server with the highest weight for `key` and records the
    /// assignment.
    ///
    /// Weight is `fast_hash(key bytes, seed = server digest seed)`. The
    /// strict `>` comparison keeps the earliest-listed server on equal
    /// weights, so selection is stable and reproducible.
    pub fn route(&mut self, key: &str) -> Result<&Server> {
        if self.servers.is_empty() {
            return Err(Error::EmptyPool);
        }

        let mut winner = 0;
        let mut highest = fast_hash(key.as_bytes(), self.keys[0].placement_seed());
        for (idx, server_key) in self.keys.iter().enumerate().skip(1) {
            let weight = fast_hash(key.as_bytes(), server_key.placement_seed());
            if weight > highest {
                highest = weight;
                winner = idx;
            }
        }

        trace!(key, server = %self.servers[winner], weight = highest, "hrw route");

        self.assigned[winner] += 1;
        self.total_routed += 1;
        Ok(&self.servers[winner])
    }

    /// Percentage of routed keys assigned to each server, in pool order.
    ///
    /// Fails with [`Error::NoDataRouted`] until at least one key has been
    /// routed. Percentages sum to 100 up to floating-point error.
    pub fn distribution(&self) -> Result<Vec<(ServerKey, f64)>> {
        if self.total_routed == 0 {
            return Err(Error::NoDataRouted);
        }
        let total = self.total_routed as f64;
        Ok(self
            .keys
            .iter()
            .zip(&self.assigned)
            .map(|(k, count)| (k.clone(), *count as f64 / total * 100.0))
            .collect())
    }

    /// Number of keys routed so far.
    pub fn total_routed(&self) -> u64 {
        self.total_routed
    }

    /// The server pool, in tie-break order.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }
}
