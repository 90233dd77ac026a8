//! Seed storage: the buffer between search workers and the seed bank uplink.
//!
//! Workers hand finished (or pending) seeds to a [`SeedStorage`]; interested
//! parties either register a [`SeedListener`] for immediate notification or poll
//! the queue with [`SeedStorage::get_seed`].

mod listener;
mod seed;
mod storage;

pub use listener::SeedListener;
pub use seed::Seed;
pub use storage::SeedStorage;
