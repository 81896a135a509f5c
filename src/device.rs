//! Per-room thermostat wrapper
//!
//! A thin device facade over the shared cache, exposing the name, unit and
//! current/target temperatures for one room. On a failed update it logs and
//! keeps its last-known values, so a flaky remote service degrades to stale
//! readings rather than errors at the display layer.

use std::sync::Arc;

use crate::cache::ThermostatCache;
use crate::data::TemperatureUnit;

/// A single room's thermostat, reading through the shared cache
pub struct Thermostat {
    cache: Arc<ThermostatCache>,
    room: String,
    name: String,
    current_temperature: Option<f64>,
    target_temperature: Option<f64>,
}

impl Thermostat {
    /// Creates a thermostat for `room`; call [`update`](Self::update) to populate it
    pub fn new(cache: Arc<ThermostatCache>, room: impl Into<String>) -> Self {
        let room = room.into();
        Self {
            cache,
            name: room.clone(),
            room,
            current_temperature: None,
            target_temperature: None,
        }
    }

    /// The room name as reported by the remote service
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit the temperatures are expressed in
    pub fn unit_of_measurement(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    /// Last known measured temperature, if any update has succeeded
    pub fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    /// Last known target temperature (setpoint)
    pub fn target_temperature(&self) -> Option<f64> {
        self.target_temperature
    }

    /// Refreshes this room's readings from the cache
    ///
    /// On failure the previous values are kept and a warning is logged;
    /// callers keep displaying the last successfully read temperatures.
    pub async fn update(&mut self) {
        match self.cache.room_temperature(&self.room, false).await {
            Ok(reading) => {
                self.current_temperature = Some(reading.current_temperature);
                self.target_temperature = Some(reading.setpoint);
                self.name = reading.name;
            }
            Err(e) => {
                tracing::warn!(
                    room = %self.room,
                    error = %e,
                    "no temperature data received; keeping last known readings"
                );
            }
        }
    }

    /// Requests a new target temperature
    ///
    /// Delegates to the cache, where setting temperatures is not
    /// implemented; the remote device state never changes.
    pub async fn set_temperature(&self, setpoint: f64) {
        self.cache.set_temperature(&self.room, setpoint).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::api::{ApiError, EvohomeBackend, EvohomeSession};
    use crate::data::{Credentials, RoomReading};

    /// Minimal scripted backend: fixed readings plus a fetch-failure toggle
    #[derive(Default)]
    struct FixedRemote {
        fail_fetch: AtomicBool,
        readings: StdMutex<Vec<RoomReading>>,
    }

    struct FixedBackend(Arc<FixedRemote>);

    #[async_trait]
    impl EvohomeBackend for FixedBackend {
        async fn login(&self, _: &Credentials) -> Result<Box<dyn EvohomeSession>, ApiError> {
            Ok(Box::new(FixedSession(self.0.clone())))
        }
    }

    struct FixedSession(Arc<FixedRemote>);

    #[async_trait]
    impl EvohomeSession for FixedSession {
        async fn list_room_temperatures(&self) -> Result<Vec<RoomReading>, ApiError> {
            if self.0.fail_fetch.load(Ordering::SeqCst) {
                return Err(ApiError::UnexpectedResponse("simulated outage".to_string()));
            }
            Ok(self.0.readings.lock().unwrap().clone())
        }
    }

    async fn lounge_cache(remote: &Arc<FixedRemote>) -> Arc<ThermostatCache> {
        *remote.readings.lock().unwrap() = vec![RoomReading {
            name: "Lounge".to_string(),
            current_temperature: 19.5,
            setpoint: 21.0,
        }];
        let cache = Arc::new(ThermostatCache::new(Arc::new(FixedBackend(remote.clone()))));
        cache
            .init(Credentials::new("u", "p", false))
            .await
            .expect("init should succeed");
        cache
    }

    #[tokio::test]
    async fn test_update_populates_readings() {
        let remote = Arc::new(FixedRemote::default());
        let cache = lounge_cache(&remote).await;
        let mut thermostat = Thermostat::new(cache, "Lounge");

        assert!(thermostat.current_temperature().is_none());
        thermostat.update().await;

        assert_eq!(thermostat.name(), "Lounge");
        assert_eq!(thermostat.current_temperature(), Some(19.5));
        assert_eq!(thermostat.target_temperature(), Some(21.0));
        assert_eq!(thermostat.unit_of_measurement(), TemperatureUnit::Celsius);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_last_known_values() {
        let remote = Arc::new(FixedRemote::default());
        let cache = lounge_cache(&remote).await;
        let mut thermostat = Thermostat::new(cache.clone(), "Lounge");
        thermostat.update().await;

        // Expire the snapshot and break the remote: the next update fails.
        remote.fail_fetch.store(true, Ordering::SeqCst);
        cache.room_temperature("Lounge", true).await.expect_err("refresh fails");
        thermostat.update().await;

        assert_eq!(thermostat.current_temperature(), Some(19.5));
        assert_eq!(thermostat.target_temperature(), Some(21.0));
    }

    #[tokio::test]
    async fn test_update_for_unknown_room_keeps_none() {
        let remote = Arc::new(FixedRemote::default());
        let cache = lounge_cache(&remote).await;
        let mut thermostat = Thermostat::new(cache, "Cellar");

        thermostat.update().await;

        assert!(thermostat.current_temperature().is_none());
        assert!(thermostat.target_temperature().is_none());
    }

    #[tokio::test]
    async fn test_set_temperature_changes_nothing() {
        let remote = Arc::new(FixedRemote::default());
        let cache = lounge_cache(&remote).await;
        let mut thermostat = Thermostat::new(cache, "Lounge");
        thermostat.update().await;

        thermostat.set_temperature(25.0).await;
        thermostat.update().await;

        assert_eq!(thermostat.target_temperature(), Some(21.0));
    }
}
