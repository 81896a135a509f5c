//! Shared client state and refresh policy
//!
//! `ThermostatCache` owns the credentials, the authenticated session, the
//! cached snapshot of room readings, and the refresh bookkeeping. Every
//! consumer shares one instance behind an `Arc` rather than holding an
//! independent copy, so all of them observe the same snapshot.
//!
//! The snapshot is only ever replaced in full: a successful fetch swaps in
//! the complete set of rooms under a short write lock, and rooms missing
//! from the remote response drop out of the cache. Remote calls run while
//! holding only the refresh gate, never the state lock, so readers are not
//! blocked behind the network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

use crate::api::{ApiError, EvohomeBackend, EvohomeSession};
use crate::data::{Credentials, RoomReading};

/// Errors that can occur when reading through the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache has never been given credentials
    #[error("no credentials configured; call init first")]
    NotConfigured,

    /// Login against the remote service failed
    #[error("login failed: {0}")]
    LoginFailed(#[source] ApiError),

    /// A login attempt was suppressed because the previous one failed recently
    #[error("login attempts suppressed until {until} after a recent failure")]
    LoginThrottled {
        /// When the next login attempt will be allowed
        until: DateTime<Utc>,
    },

    /// Fetching room readings from the remote service failed
    #[error("fetching room temperatures failed: {0}")]
    FetchFailed(#[source] ApiError),

    /// The requested room was not present in the latest snapshot
    #[error("room '{0}' not found in the latest readings")]
    RoomNotFound(String),

    /// A remote call did not complete within the configured deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Which remote call timed out ("login" or "fetch")
        operation: &'static str,
        /// The deadline that expired
        after: Duration,
    },
}

/// Tunables for the refresh decision
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Maximum age of a snapshot before a read forces a new remote fetch
    pub staleness_ttl: Duration,
    /// How long to suppress login attempts after a failed login
    pub login_backoff: Duration,
    /// Deadline applied to each remote login/fetch call
    pub remote_timeout: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            staleness_ttl: Duration::from_secs(5 * 60),
            login_backoff: Duration::from_secs(30),
            remote_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything protected by the state lock
struct CacheState {
    /// Account credentials, set on first init and kept for the process lifetime
    credentials: Option<Credentials>,
    /// Authenticated session, present after a successful login
    session: Option<Arc<dyn EvohomeSession>>,
    /// The snapshot: room name to latest reading, replaced as a unit
    rooms: HashMap<String, RoomReading>,
    /// True once a login+fetch pair has succeeded; any failure resets it
    initialized: bool,
    /// When the snapshot was last successfully replaced
    last_fetch_at: Option<DateTime<Utc>>,
    /// When a login last failed, for backoff
    last_failed_login_at: Option<DateTime<Utc>>,
}

/// Read-through cache over the remote Evohome API
///
/// Constructed explicitly and shared via `Arc`; all device wrappers and the
/// CLI read through the same instance.
pub struct ThermostatCache {
    backend: Arc<dyn EvohomeBackend>,
    policy: CachePolicy,
    state: RwLock<CacheState>,
    /// Serializes refreshes so concurrent stale readers produce one fetch
    refresh_gate: Mutex<()>,
}

/// Converts a policy duration to chrono for timestamp arithmetic
fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

impl ThermostatCache {
    /// Creates a cache with the default policy (5 minute TTL)
    pub fn new(backend: Arc<dyn EvohomeBackend>) -> Self {
        Self::with_policy(backend, CachePolicy::default())
    }

    /// Creates a cache with a custom refresh policy
    pub fn with_policy(backend: Arc<dyn EvohomeBackend>, policy: CachePolicy) -> Self {
        Self {
            backend,
            policy,
            state: RwLock::new(CacheState {
                credentials: None,
                session: None,
                rooms: HashMap::new(),
                initialized: false,
                last_fetch_at: None,
                last_failed_login_at: None,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Stores credentials and performs an initial login+fetch to validate them
    ///
    /// If the cache is already initialized this is a no-op: the account is
    /// fixed for the process lifetime and later calls with different
    /// credentials are silently ignored.
    pub async fn init(&self, credentials: Credentials) -> Result<(), CacheError> {
        {
            let mut state = self.state.write().await;
            if state.initialized {
                return Ok(());
            }
            state.credentials = Some(credentials);
        }
        self.ensure_fresh(false).await
    }

    /// Returns the reading for `room`, refreshing the snapshot if needed
    ///
    /// A refresh happens when the cache is uninitialized, `force_refresh` is
    /// set, or the snapshot is older than the staleness TTL. Any failure,
    /// including an unknown room, resets the cache to uninitialized so the
    /// next read re-attempts login from scratch.
    pub async fn room_temperature(
        &self,
        room: &str,
        force_refresh: bool,
    ) -> Result<RoomReading, CacheError> {
        self.ensure_fresh(force_refresh).await?;

        let reading = {
            let state = self.state.read().await;
            state.rooms.get(room).cloned()
        };
        match reading {
            Some(reading) => Ok(reading),
            None => {
                let mut state = self.state.write().await;
                state.initialized = false;
                Err(CacheError::RoomNotFound(room.to_string()))
            }
        }
    }

    /// Returns all readings from the snapshot, sorted by room name
    pub async fn room_temperatures(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<RoomReading>, CacheError> {
        self.ensure_fresh(force_refresh).await?;

        let state = self.state.read().await;
        let mut readings: Vec<RoomReading> = state.rooms.values().cloned().collect();
        readings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(readings)
    }

    /// Sets a room's target temperature
    ///
    /// Not implemented: the remote device state never changes. Kept in the
    /// contract so device wrappers have a write surface to delegate to.
    pub async fn set_temperature(&self, room: &str, setpoint: f64) {
        tracing::debug!(room, setpoint, "set_temperature is not implemented; ignoring");
    }

    /// Whether a login+fetch pair has succeeded and not been invalidated since
    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    /// When the snapshot was last successfully replaced
    pub async fn last_fetch_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_fetch_at
    }

    /// Refreshes the snapshot if the policy calls for it
    async fn ensure_fresh(&self, force_refresh: bool) -> Result<(), CacheError> {
        if !self.needs_refresh(force_refresh).await? {
            return Ok(());
        }

        let _gate = self.refresh_gate.lock().await;
        // A concurrent caller may have refreshed while we waited on the gate.
        if !self.needs_refresh(force_refresh).await? {
            return Ok(());
        }

        let (credentials, existing_session) = {
            let state = self.state.read().await;
            let credentials = state.credentials.clone().ok_or(CacheError::NotConfigured)?;
            let session = if state.initialized {
                state.session.clone()
            } else {
                None
            };
            (credentials, session)
        };

        let session = match existing_session {
            Some(session) => session,
            None => self.login(&credentials).await?,
        };

        self.fetch(session).await
    }

    /// Whether the next read must hit the remote service first
    async fn needs_refresh(&self, force_refresh: bool) -> Result<bool, CacheError> {
        let state = self.state.read().await;
        if state.credentials.is_none() {
            return Err(CacheError::NotConfigured);
        }
        if !state.initialized || force_refresh {
            return Ok(true);
        }
        let ttl = to_chrono(self.policy.staleness_ttl);
        Ok(state
            .last_fetch_at
            .map(|at| Utc::now() - at > ttl)
            .unwrap_or(false))
    }

    /// Logs in and stores the resulting session
    ///
    /// A failed login stamps `last_failed_login_at`; further attempts inside
    /// the backoff window fail fast without touching the remote service.
    async fn login(&self, credentials: &Credentials) -> Result<Arc<dyn EvohomeSession>, CacheError> {
        let throttled_until = {
            let state = self.state.read().await;
            state
                .last_failed_login_at
                .map(|at| at + to_chrono(self.policy.login_backoff))
        };
        if let Some(until) = throttled_until {
            if Utc::now() < until {
                return Err(CacheError::LoginThrottled { until });
            }
        }

        tracing::debug!(username = %credentials.username, "logging in to the remote service");
        let outcome = timeout(self.policy.remote_timeout, self.backend.login(credentials)).await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(Ok(session)) => {
                let session: Arc<dyn EvohomeSession> = Arc::from(session);
                state.session = Some(session.clone());
                Ok(session)
            }
            Ok(Err(e)) => {
                state.initialized = false;
                state.last_failed_login_at = Some(Utc::now());
                Err(CacheError::LoginFailed(e))
            }
            Err(_elapsed) => {
                state.initialized = false;
                state.last_failed_login_at = Some(Utc::now());
                Err(CacheError::Timeout {
                    operation: "login",
                    after: self.policy.remote_timeout,
                })
            }
        }
    }

    /// Fetches all room readings and swaps in the new snapshot
    async fn fetch(&self, session: Arc<dyn EvohomeSession>) -> Result<(), CacheError> {
        let outcome = timeout(self.policy.remote_timeout, session.list_room_temperatures()).await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(Ok(readings)) => {
                state.rooms = readings
                    .into_iter()
                    .map(|reading| (reading.name.clone(), reading))
                    .collect();
                state.initialized = true;
                state.last_fetch_at = Some(Utc::now());
                tracing::debug!(rooms = state.rooms.len(), "snapshot replaced");
                Ok(())
            }
            Ok(Err(e)) => {
                state.initialized = false;
                Err(CacheError::FetchFailed(e))
            }
            Err(_elapsed) => {
                state.initialized = false;
                Err(CacheError::Timeout {
                    operation: "fetch",
                    after: self.policy.remote_timeout,
                })
            }
        }
    }

    /// Ages the snapshot so TTL expiry can be tested without waiting
    #[cfg(test)]
    async fn backdate_last_fetch(&self, age: chrono::Duration) {
        let mut state = self.state.write().await;
        if let Some(at) = state.last_fetch_at {
            state.last_fetch_at = Some(at - age);
        }
    }
}
