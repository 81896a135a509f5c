//! Read-through cache for Evohome room temperatures
//!
//! This module provides a cache that fronts the remote Evohome API with a
//! time-bounded staleness window. Readings for all rooms are fetched in one
//! remote call and replaced as a single snapshot; readers within the
//! staleness TTL are served from memory without touching the network.

mod state;

pub use state::{CacheError, CachePolicy, ThermostatCache};
