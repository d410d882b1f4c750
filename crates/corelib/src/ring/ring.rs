//! Fixed-modulus consistent hash ring with virtual nodes.
//!
//! # Virtual nodes
//!
//! Each server is hashed onto the ring at several positions instead of one.
//! More positions per server smooth out the load skew that a single
//! placement would produce, and when a server leaves, its keys spread over
//! several successors instead of dumping onto one neighbor.
//!
//! # Lookup
//!
//! A key hashes to a target position in `0..size`; the owner is the nearest
//! occupied position clockwise from the target (smallest occupied position
//! `>= target`, wrapping past the top of the ring). The replica owner is the
//! next occupied position after the primary, again wrapping.

use std::collections::{btree_map::Entry, BTreeMap, HashMap};
use std::ops::Bound;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash::fast_hash;
use crate::server::{Server, ServerKey};

/// One occupied ring position and the server that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub position: u64,
    pub server: ServerKey,
}

/// Result of routing a key: where it hashed and who owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTarget {
    /// Raw ring position the key hashed to.
    pub target: u64,
    /// Nearest occupied position clockwise from `target`.
    pub primary: Placement,
    /// Next occupied position after the primary (the primary itself when it
    /// is the only position on the ring).
    pub replica: Placement,
}

/// Where the keys of one vacated position go after a removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RehashMove {
    /// Position the removed server used to occupy.
    pub vacated: u64,
    /// Surviving clockwise successor that owns those keys now. `None` when
    /// the removal emptied the ring.
    pub new_owner: Option<Placement>,
}

/// Structured account of a removal, one move per evicted position.
///
/// Presentation (the human-readable rehash notice) is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RehashReport {
    pub removed: ServerKey,
    pub moves: Vec<RehashMove>,
}

/// Consistent hash ring over positions `0..size`.
///
/// `positions` is the authoritative placement map; a `BTreeMap` keeps the
/// walk order sorted at all times, so no separate position list has to be
/// re-sorted after mutations. `placements` is its per-server inverse and
/// always holds every position an identity owns.
#[derive(Debug, Clone)]
pub struct ConsistentRing {
    /// Ring modulus, fixed at construction.
    size: u64,
    /// Virtual nodes placed per server at construction.
    vnodes: usize,
    positions: BTreeMap<u64, ServerKey>,
    placements: HashMap<ServerKey, Vec<u64>>,
    servers: HashMap<ServerKey, Server>,
}

impl ConsistentRing {
    /// Builds a ring and places `vnodes` virtual nodes for every server.
    ///
    /// Placement of slot `i` probes `fast_hash(digest hex, seed = i + c) %
    /// size` for collision counter `c = 0, 1, ...` until a free position
    /// turns up. Probing is over seed space, not ring space, so occupied
    /// neighborhoods don't clump the retries.
    ///
    /// Fails with [`Error::RingSaturated`] when no free position can be
    /// found, and with [`Error::ServerAlreadyPresent`] on a duplicate
    /// identity in `servers`.
    pub fn new(servers: Vec<Server>, size: u64, vnodes: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("ring size must be non-zero".into()));
        }
        if vnodes == 0 {
            return Err(Error::InvalidConfig(
                "virtual node count must be non-zero".into(),
            ));
        }

        let mut ring = Self {
            size,
            vnodes,
            positions: BTreeMap::new(),
            placements: HashMap::new(),
            servers: HashMap::new(),
        };

        for server in servers {
            let key = server.key();
            if ring.servers.contains_key(&key) {
                return Err(Error::ServerAlreadyPresent(key));
            }
            let mut owned = Vec::with_capacity(vnodes);
            for slot in 0..vnodes {
                owned.push(ring.place(&key, slot as u64)?);
            }
            debug!(server = %server, key = %key, positions = ?owned, "placed server");
            ring.placements.insert(key.clone(), owned);
            ring.servers.insert(key, server);
        }

        Ok(ring)
    }

    /// Probes for a free position starting at `seed` and records it.
    fn place(&mut self, key: &ServerKey, seed: u64) -> Result<u64> {
        if self.positions.len() as u64 >= self.size {
            return Err(Error::RingSaturated { size: self.size });
        }
        // Bounded probe: a full scan of seed space the size of the ring is
        // enough to declare saturation rather than loop forever.
        for collisions in 0..self.size {
            let candidate = fast_hash(key.as_hex().as_bytes(), seed + collisions) % self.size;
            if let Entry::Vacant(slot) = self.positions.entry(candidate) {
                slot.insert(key.clone());
                return Ok(candidate);
            }
        }
        Err(Error::RingSaturated { size: self.size })
    }

    /// Routes a key to its primary and replica placements.
    pub fn route(&self, key: &str) -> Result<RouteTarget> {
        let target = fast_hash(key.as_bytes(), 0) % self.size;
        self.walk(target)
    }

    /// Clockwise walk from a raw ring position.
    fn walk(&self, target: u64) -> Result<RouteTarget> {
        if self.positions.is_empty() {
            return Err(Error::EmptyRing);
        }

        let (primary_pos, primary_key) = self
            .positions
            .range(target..)
            .next()
            // Nothing at or after the target: wrap to the start of the ring.
            .or_else(|| self.positions.iter().next())
            .map(|(p, k)| (*p, k.clone()))
            .ok_or(Error::EmptyRing)?;

        let replica = self
            .successor(primary_pos)
            .unwrap_or_else(|| Placement {
                position: primary_pos,
                server: primary_key.clone(),
            });

        Ok(RouteTarget {
            target,
            primary: Placement {
                position: primary_pos,
                server: primary_key,
            },
            replica,
        })
    }

    /// Next occupied position strictly after `position`, wrapping. `None`
    /// only when `position` is the sole occupant or the ring is empty.
    fn successor(&self, position: u64) -> Option<Placement> {
        self.positions
            .range((Bound::Excluded(position), Bound::Unbounded))
            .next()
            .or_else(|| {
                self.positions
                    .iter()
                    .next()
                    .filter(|(first, _)| **first != position)
            })
            .map(|(p, k)| Placement {
                position: *p,
                server: k.clone(),
            })
    }

    /// Places one position for a new server, probing from seed 0.
    ///
    /// Returns the resolved position. Fails with
    /// [`Error::ServerAlreadyPresent`] if the identity is already on the
    /// ring.
    pub fn add_server(&mut self, server: Server) -> Result<u64> {
        let key = server.key();
        if self.servers.contains_key(&key) {
            return Err(Error::ServerAlreadyPresent(key));
        }
        let position = self.place(&key, 0)?;
        debug!(server = %server, key = %key, position, "added server");
        self.placements.insert(key.clone(), vec![position]);
        self.servers.insert(key, server);
        Ok(position)
    }

    /// Removes a server and every position it owns.
    ///
    /// The report lists, per vacated position, the surviving clockwise
    /// successor that owns its keys from now on — computed against the ring
    /// *after* eviction, so a server's positions never name each other as
    /// successors.
    pub fn remove_server(&mut self, key: &ServerKey) -> Result<RehashReport> {
        let owned = self
            .placements
            .remove(key)
            .ok_or_else(|| Error::ServerNotFound(key.clone()))?;
        self.servers.remove(key);
        for position in &owned {
            self.positions.remove(position);
        }

        let moves = owned
            .into_iter()
            .map(|vacated| RehashMove {
                vacated,
                // A vacated position is no longer occupied, so the
                // inclusive range still starts strictly after it.
                new_owner: self
                    .positions
                    .range(vacated..)
                    .next()
                    .or_else(|| self.positions.iter().next())
                    .map(|(p, k)| Placement {
                        position: *p,
                        server: k.clone(),
                    }),
            })
            .collect();

        debug!(key = %key, "removed server");
        Ok(RehashReport {
            removed: key.clone(),
            moves,
        })
    }

    /// Raw ring position a key hashes to, before the walk.
    pub fn key_position(&self, key: &str) -> u64 {
        fast_hash(key.as_bytes(), 0) % self.size
    }

    /// All occupied positions, ascending.
    pub fn occupied(&self) -> Vec<u64> {
        self.positions.keys().copied().collect()
    }

    /// Owner of an occupied position, if any.
    pub fn position_owner(&self, position: u64) -> Option<&ServerKey> {
        self.positions.get(&position)
    }

    /// Server record for an identity on the ring.
    pub fn server(&self, key: &ServerKey) -> Option<&Server> {
        self.servers.get(key)
    }

    /// Key of the server with the given name, for callers that address
    /// servers by name rather than digest.
    pub fn find_by_name(&self, name: &str) -> Option<ServerKey> {
        self.servers
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(k, _)| k.clone())
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Ring modulus.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Virtual nodes placed per server at construction.
    pub fn vnodes(&self) -> usize {
        self.vnodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(i: u16) -> Server {
        Server::new(format!("node-{i}"), "127.0.0.1", 4000 + i)
    }

    /// Ring with hand-picked positions, bypassing hashing, so walk
    /// behavior can be asserted against known coordinates.
    fn fixed_ring(size: u64, owners: &[(u64, &Server)]) -> ConsistentRing {
        let mut positions = BTreeMap::new();
        let mut placements: HashMap<ServerKey, Vec<u64>> = HashMap::new();
        let mut servers = HashMap::new();
        for (position, srv) in owners {
            let key = srv.key();
            positions.insert(*position, key.clone());
            placements.entry(key.clone()).or_default().push(*position);
            servers.insert(key, (*srv).clone());
        }
        ConsistentRing {
            size,
            vnodes: 2,
            positions,
            placements,
            servers,
        }
    }

    #[test]
    fn test_walk_picks_next_clockwise() {
        let (a, b, c) = (server(0), server(1), server(2));
        let ring = fixed_ring(
            500,
            &[(12, &a), (47, &b), (88, &a), (203, &c), (310, &b), (466, &c)],
        );

        let hit = ring.walk(90).unwrap();
        assert_eq!(hit.primary.position, 203);
        assert_eq!(hit.replica.position, 310);

        // Exact hit on an occupied position owns it.
        let exact = ring.walk(203).unwrap();
        assert_eq!(exact.primary.position, 203);
    }

    #[test]
    fn test_walk_wraps_past_last_position() {
        let (a, b) = (server(0), server(1));
        let ring = fixed_ring(500, &[(12, &a), (310, &b)]);

        let hit = ring.walk(480).unwrap();
        assert_eq!(hit.primary.position, 12);
        assert_eq!(hit.replica.position, 310);
    }

    #[test]
    fn test_single_position_replicates_to_itself() {
        let a = server(0);
        let ring = fixed_ring(500, &[(42, &a)]);
        let hit = ring.walk(100).unwrap();
        assert_eq!(hit.primary.position, 42);
        assert_eq!(hit.replica.position, 42);
    }

    #[test]
    fn test_remove_rehashes_to_surviving_successor() {
        let (a, b, c) = (server(0), server(1), server(2));
        let mut ring = fixed_ring(
            500,
            &[(12, &a), (47, &b), (88, &a), (203, &c), (310, &b), (466, &c)],
        );

        let report = ring.remove_server(&c.key()).unwrap();
        assert_eq!(report.moves.len(), 2);

        // Keys that walked to 203 now belong to 310; 466's keys wrap to 12.
        let for_203 = report.moves.iter().find(|m| m.vacated == 203).unwrap();
        assert_eq!(for_203.new_owner.as_ref().unwrap().position, 310);
        let for_466 = report.moves.iter().find(|m| m.vacated == 466).unwrap();
        assert_eq!(for_466.new_owner.as_ref().unwrap().position, 12);

        let hit = ring.walk(90).unwrap();
        assert_eq!(hit.primary.position, 310);
    }

    #[test]
    fn test_remove_last_server_reports_no_owner() {
        let a = server(0);
        let mut ring = fixed_ring(500, &[(42, &a)]);
        let report = ring.remove_server(&a.key()).unwrap();
        assert_eq!(report.moves[0].new_owner, None);
        assert_eq!(ring.walk(0), Err(Error::EmptyRing));
    }

    #[test]
    fn test_successors_skip_removed_siblings() {
        // Both of c's positions sit together; neither may be reported as
        // the other's rehash target.
        let (a, c) = (server(0), server(2));
        let mut ring = fixed_ring(500, &[(100, &c), (101, &c), (400, &a)]);
        let report = ring.remove_server(&c.key()).unwrap();
        for m in &report.moves {
            assert_eq!(m.new_owner.as_ref().unwrap().position, 400);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            ConsistentRing::new(vec![server(0)], 0, 2),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ConsistentRing::new(vec![server(0)], 500, 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicate_server_in_pool_rejected() {
        let dup = server(0);
        assert!(matches!(
            ConsistentRing::new(vec![dup.clone(), dup], 500, 2),
            Err(Error::ServerAlreadyPresent(_))
        ));
    }

    #[test]
    fn test_saturation_is_detected() {
        // 3 servers * 2 vnodes = 6 placements cannot fit a ring of 4.
        let pool = vec![server(0), server(1), server(2)];
        assert!(matches!(
            ConsistentRing::new(pool, 4, 2),
            Err(Error::RingSaturated { size: 4 })
        ));
    }
}
