//! Core data models for Evotherm
//!
//! This module contains the data types shared across the crate for
//! representing account credentials and per-room thermostat readings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account credentials for the Evohome web service
///
/// Established once when the cache is first initialized and immutable for
/// the lifetime of the process. Re-initializing an already-initialized cache
/// with different credentials is silently ignored (single fixed account).
#[derive(Clone)]
pub struct Credentials {
    /// Account username (usually an email address)
    pub username: String,
    /// Account password
    pub password: String,
    /// Whether to log remote request/response detail
    pub debug: bool,
}

impl Credentials {
    /// Creates credentials for the given account
    pub fn new(username: impl Into<String>, password: impl Into<String>, debug: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            debug,
        }
    }
}

// Manual Debug so the password never reaches log output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("debug", &self.debug)
            .finish()
    }
}

/// A single room's thermostat reading as returned by the remote service
///
/// Produced wholesale by a remote fetch; never partially updated. The cache
/// snapshot is a map from room name to the room's latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomReading {
    /// Room name as configured on the Evohome controller
    pub name: String,
    /// Measured temperature in degrees Celsius
    pub current_temperature: f64,
    /// Target temperature (setpoint) in degrees Celsius
    pub setpoint: f64,
}

/// Unit of measurement for reported temperatures
///
/// The Evohome web service reports Celsius only; the enum exists so the
/// device wrapper can expose a unit without hardcoding a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "°C"),
        }
    }
}
