//! Evohome v1 REST API client
//!
//! This module implements the [`EvohomeBackend`] and [`EvohomeSession`]
//! traits against the Honeywell Total Connect Comfort v1 endpoints: a
//! session login that yields a session token, and an all-locations listing
//! that carries every device's current temperature and setpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ApiError, EvohomeBackend, EvohomeSession};
use crate::data::{Credentials, RoomReading};

/// Base URL for the Evohome v1 web API
const EVOHOME_BASE_URL: &str = "https://tccna.honeywell.com/WebAPI/api";

/// Application id expected by the session endpoint
const APPLICATION_ID: &str = "91db1612-73fd-4500-91b2-e63b069b185c";

/// Response from the session login endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    session_id: String,
    user_info: UserInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfo {
    #[serde(rename = "userID")]
    user_id: u64,
}

/// One location in the all-locations listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationResponse {
    devices: Vec<DeviceResponse>,
}

/// One device (zone) within a location
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceResponse {
    name: String,
    thermostat: Option<ThermostatResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThermostatResponse {
    indoor_temperature: f64,
    changeable_values: ChangeableValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeatSetpoint {
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeableValues {
    heat_setpoint: HeatSetpoint,
}

/// Flattens the all-locations listing into per-room readings
///
/// Devices without thermostat data (e.g. hot-water controllers) are skipped.
fn readings_from_locations(locations: Vec<LocationResponse>) -> Vec<RoomReading> {
    locations
        .into_iter()
        .flat_map(|location| location.devices)
        .filter_map(|device| {
            let thermostat = device.thermostat?;
            Some(RoomReading {
                name: device.name,
                current_temperature: thermostat.indoor_temperature,
                setpoint: thermostat.changeable_values.heat_setpoint.value,
            })
        })
        .collect()
}

/// Backend that talks to the real Evohome web service
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl Default for RestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RestBackend {
    /// Creates a backend against the production Evohome endpoints
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: EVOHOME_BASE_URL.to_string(),
        }
    }

    /// Creates a backend with a custom HTTP client
    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: EVOHOME_BASE_URL.to_string(),
        }
    }

    /// Overrides the base URL (used against a local stub server)
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EvohomeBackend for RestBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Box<dyn EvohomeSession>, ApiError> {
        let url = format!("{}/Session", self.base_url);
        let body = serde_json::json!({
            "Username": credentials.username,
            "Password": credentials.password,
            "ApplicationId": APPLICATION_ID,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthRejected);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let text = response.text().await?;
        if credentials.debug {
            tracing::debug!(body = %text, "session response");
        }
        let session: SessionResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::UnexpectedResponse(e.to_string()))?;

        Ok(Box::new(RestSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_id: session.session_id,
            user_id: session.user_info.user_id,
            debug: credentials.debug,
        }))
    }
}

/// An authenticated session holding the v1 session token
struct RestSession {
    client: Client,
    base_url: String,
    session_id: String,
    user_id: u64,
    debug: bool,
}

#[async_trait]
impl EvohomeSession for RestSession {
    async fn list_room_temperatures(&self) -> Result<Vec<RoomReading>, ApiError> {
        let url = format!(
            "{}/locations?userId={}&allData=True",
            self.base_url, self.user_id
        );

        let response = self
            .client
            .get(&url)
            .header("sessionId", &self.session_id)
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthRejected);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let text = response.text().await?;
        if self.debug {
            tracing::debug!(body = %text, "locations response");
        }
        let locations: Vec<LocationResponse> = serde_json::from_str(&text)
            .map_err(|e| ApiError::UnexpectedResponse(e.to_string()))?;

        Ok(readings_from_locations(locations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATIONS_JSON: &str = r#"
    [
        {
            "locationID": 23456,
            "name": "Home",
            "devices": [
                {
                    "deviceID": 111,
                    "name": "Lounge",
                    "thermostat": {
                        "units": "Celsius",
                        "indoorTemperature": 19.5,
                        "changeableValues": {
                            "mode": "Scheduled",
                            "heatSetpoint": { "value": 21.0, "status": "Scheduled" }
                        }
                    }
                },
                {
                    "deviceID": 112,
                    "name": "Study",
                    "thermostat": {
                        "units": "Celsius",
                        "indoorTemperature": 17.0,
                        "changeableValues": {
                            "heatSetpoint": { "value": 16.0 }
                        }
                    }
                },
                {
                    "deviceID": 113,
                    "name": "Hot Water"
                }
            ]
        }
    ]
    "#;

    #[test]
    fn test_parse_locations_flattens_devices() {
        let locations: Vec<LocationResponse> =
            serde_json::from_str(LOCATIONS_JSON).expect("Failed to parse locations JSON");
        let readings = readings_from_locations(locations);

        assert_eq!(readings.len(), 2, "device without thermostat data is skipped");
        assert_eq!(readings[0].name, "Lounge");
        assert!((readings[0].current_temperature - 19.5).abs() < 0.01);
        assert!((readings[0].setpoint - 21.0).abs() < 0.01);
        assert_eq!(readings[1].name, "Study");
        assert!((readings[1].setpoint - 16.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_session_response() {
        let json = r#"
        {
            "sessionId": "ABC-123",
            "userInfo": { "userID": 98765, "username": "user@example.com" }
        }
        "#;
        let session: SessionResponse =
            serde_json::from_str(json).expect("Failed to parse session JSON");

        assert_eq!(session.session_id, "ABC-123");
        assert_eq!(session.user_info.user_id, 98765);
    }

    #[test]
    fn test_parse_empty_locations() {
        let locations: Vec<LocationResponse> =
            serde_json::from_str("[]").expect("Failed to parse empty listing");
        let readings = readings_from_locations(locations);
        assert!(readings.is_empty());
    }
}
