//! Subcommand implementations.
//!
//! The demo pool stands in for whatever inventory a real deployment would
//! supply; the core only ever sees a list of identity records.

use anyhow::Context;
use clap::Subcommand;
use corelib::{ConsistentRing, HrwRing, Server};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route keys with highest-random-weight hashing and report the spread.
    Hrw {
        /// Number of demo servers in the pool.
        #[arg(long, default_value_t = 4)]
        servers: u16,
        /// Keys to route; a built-in sample batch when omitted.
        keys: Vec<String>,
    },
    /// Route keys over a consistent-hash ring, optionally churning a server.
    Ring {
        /// Ring modulus.
        #[arg(long, default_value_t = 500)]
        size: u64,
        /// Virtual nodes per server.
        #[arg(long, default_value_t = 2)]
        vnodes: usize,
        /// Number of demo servers in the pool.
        #[arg(long, default_value_t = 4)]
        servers: u16,
        /// Remove this server (by name) after routing and show the rehash.
        #[arg(long)]
        remove: Option<String>,
        /// Re-add a server with this name after any removal.
        #[arg(long)]
        add: Option<String>,
        /// Keys to route; a built-in sample batch when omitted.
        keys: Vec<String>,
    },
}

fn demo_pool(n: u16) -> Vec<Server> {
    (0..n)
        .map(|i| Server::new(format!("node-{i}"), "127.0.0.1", 4000 + i))
        .collect()
}

fn sample_keys() -> Vec<String> {
    (0..32).map(|i| format!("sample-key-{i}")).collect()
}

impl Command {
    pub fn run(self, json: bool) -> anyhow::Result<()> {
        match self {
            Command::Hrw { servers, keys } => run_hrw(servers, keys, json),
            Command::Ring {
                size,
                vnodes,
                servers,
                remove,
                add,
                keys,
            } => run_ring(size, vnodes, servers, remove, add, keys, json),
        }
    }
}

fn run_hrw(servers: u16, keys: Vec<String>, json: bool) -> anyhow::Result<()> {
    let pool = demo_pool(servers);
    let mut ring = HrwRing::new(pool);
    let keys = if keys.is_empty() { sample_keys() } else { keys };

    for key in &keys {
        let server = ring.route(key)?;
        if !json {
            println!("{key} -> {server}");
        }
    }

    let distribution = ring.distribution()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&distribution)?);
        return Ok(());
    }
    println!("\ndistribution over {} keys:", ring.total_routed());
    for (server, (key, pct)) in ring.servers().iter().zip(&distribution) {
        println!("  {server} [{key}]: {pct:.1}%");
    }
    Ok(())
}

fn run_ring(
    size: u64,
    vnodes: usize,
    servers: u16,
    remove: Option<String>,
    add: Option<String>,
    keys: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let pool = demo_pool(servers);
    let mut ring = ConsistentRing::new(pool, size, vnodes)?;
    let keys = if keys.is_empty() { sample_keys() } else { keys };

    if !json {
        println!("occupied positions: {:?}", ring.occupied());
    }
    for key in &keys {
        route_one(&ring, key, json)?;
    }

    if let Some(name) = remove {
        let victim = ring
            .find_by_name(&name)
            .with_context(|| format!("no server named {name} on the ring"))?;
        let report = ring.remove_server(&victim)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for m in &report.moves {
                match &m.new_owner {
                    Some(owner) => {
                        let server = ring
                            .server(&owner.server)
                            .map(ToString::to_string)
                            .unwrap_or_else(|| owner.server.to_string());
                        println!(
                            "position {} vacated; its keys now route to {server} at {}",
                            m.vacated, owner.position
                        );
                    }
                    None => println!("position {} vacated; ring is now empty", m.vacated),
                }
            }
        }
    }

    if let Some(name) = add {
        // Demo servers occupy ports 4000..4000+servers; the next port is
        // free no matter what was removed above.
        let server = Server::new(name, "127.0.0.1", 4000 + servers);
        let position = ring.add_server(server.clone())?;
        if !json {
            println!("added {server} at position {position}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_server_never_collides_with_demo_pool() {
        // Churn first: removing a demo server must not let a later --add
        // reproduce an existing identity.
        let servers = 4u16;
        let mut ring = ConsistentRing::new(demo_pool(servers), 500, 2).unwrap();
        let victim = ring.find_by_name("node-1").unwrap();
        ring.remove_server(&victim).unwrap();

        // Reusing a surviving server's name is fine; the port must not
        // land back on that server's identity.
        let added = Server::new("node-3", "127.0.0.1", 4000 + servers);
        assert!(ring.add_server(added).is_ok());
    }
}

fn route_one(ring: &ConsistentRing, key: &str, json: bool) -> anyhow::Result<()> {
    let hit = ring.route(key)?;
    if json {
        println!("{}", serde_json::to_string(&hit)?);
        return Ok(());
    }
    let primary = ring
        .server(&hit.primary.server)
        .map(ToString::to_string)
        .unwrap_or_else(|| hit.primary.server.to_string());
    let replica = ring
        .server(&hit.replica.server)
        .map(ToString::to_string)
        .unwrap_or_else(|| hit.replica.server.to_string());
    println!(
        "{key} (target {}) -> {primary} at {}, replica {replica} at {}",
        hit.target, hit.primary.position, hit.replica.position
    );
    Ok(())
}
