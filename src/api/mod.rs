//! Remote Evohome API collaborator
//!
//! This module defines the seam between the cache and the vendor web
//! service: an object-safe pair of async traits (login produces a session,
//! a session lists all room readings) plus the error type shared by
//! implementations. The production implementation lives in [`rest`]; tests
//! substitute scripted in-memory backends.

pub mod rest;

pub use rest::RestBackend;

use async_trait::async_trait;
use thiserror::Error;

use crate::data::{Credentials, RoomReading};

/// Errors produced by a backend or session
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service rejected the supplied credentials
    #[error("authentication rejected by the remote service")]
    AuthRejected,

    /// HTTP transport failure (connection, TLS, timeout at the wire level)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with an unexpected HTTP status
    #[error("unexpected status {0} from the remote service")]
    Status(reqwest::StatusCode),

    /// The response body did not have the expected shape
    #[error("unexpected response from the remote service: {0}")]
    UnexpectedResponse(String),
}

/// Entry point to the remote service: exchanges credentials for a session
///
/// Object-safe so the cache can hold an `Arc<dyn EvohomeBackend>` and tests
/// can inject mocks.
#[async_trait]
pub trait EvohomeBackend: Send + Sync {
    /// Authenticates against the remote service
    ///
    /// On success returns a session handle that can list room readings.
    /// Login performs no data fetch of its own.
    async fn login(&self, credentials: &Credentials) -> Result<Box<dyn EvohomeSession>, ApiError>;
}

/// An authenticated session against the remote service
#[async_trait]
pub trait EvohomeSession: Send + Sync {
    /// Fetches the current reading for every room in the account
    ///
    /// Always returns the complete set of rooms; the cache replaces its
    /// snapshot wholesale from the result.
    async fn list_room_temperatures(&self) -> Result<Vec<RoomReading>, ApiError>;
}
