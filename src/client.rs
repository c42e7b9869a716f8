use log::{debug, error};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{AuthEvent, TokenManager};
use crate::error::{Error, Result};
use crate::models::{
    DeviceListResponse, MeasureResponse, StationsDataResponse, StatusResponse,
    ThermStateResponse, UserResponse,
};
use crate::types::{
    cap_limit, to_unix_seconds, Credentials, DateBound, DeviceListOptions, GetMeasureOptions,
    SetThermPointOptions, StationsDataOptions, SyncScheduleOptions, ThermStateOptions,
};

const BASE_URL: &str = "https://api.netatmo.net";

/// Client for the Netatmo weather-station and thermostat API.
///
/// Every operation obtains an access token from the shared [`TokenManager`]
/// (a cache hit is free), POSTs a form-encoded request to its fixed path and
/// projects the JSON response. Cloning is cheap and clones share the token
/// cache.
#[derive(Clone)]
pub struct NetatmoClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
}

impl NetatmoClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::new_with_base_url(credentials, BASE_URL)
    }

    pub fn new_with_base_url(credentials: Credentials, base_url: &str) -> Self {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();
        let tokens = TokenManager::new(http.clone(), &base_url, credentials);
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access token currently cached by the token manager, if any.
    pub async fn cached_access_token(&self) -> Option<String> {
        self.tokens.cached_token().await
    }

    /// Subscribe to authentication lifecycle events (background refresh
    /// failures are only observable here).
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tokens.subscribe()
    }

    /// Cancel any scheduled token refresh. The cached token stays usable.
    pub async fn stop(&self) {
        self.tokens.stop().await;
    }

    /// Fetch the authenticated user's profile.
    pub async fn get_user(&self) -> Result<Value> {
        let response: UserResponse = self.post_form("/api/getuser", Vec::new()).await?;
        Ok(response.body)
    }

    /// List the account's modules and devices.
    pub async fn get_device_list(
        &self,
        options: &DeviceListOptions,
    ) -> Result<(Vec<Value>, Vec<Value>)> {
        let mut form = Vec::new();
        if let Some(app_type) = &options.app_type {
            form.push(("app_type", app_type.clone()));
        }

        let response: DeviceListResponse = self.post_form("/api/devicelist", form).await?;
        Ok((response.body.modules, response.body.devices))
    }

    /// Fetch weather station data.
    pub async fn get_stations_data(&self, options: &StationsDataOptions) -> Result<Value> {
        let mut form = Vec::new();
        if let Some(app_type) = &options.app_type {
            form.push(("app_type", app_type.clone()));
        }

        let response: StationsDataResponse = self.post_form("/api/getstationsdata", form).await?;
        Ok(response.body)
    }

    /// Fetch measurements for a device or module.
    pub async fn get_measure(&self, options: &GetMeasureOptions) -> Result<Value> {
        options.validate()?;

        let mut form = vec![
            ("device_id", options.device_id.clone()),
            ("scale", options.scale.clone()),
            ("type", options.types.normalized()),
        ];

        if let Some(module_id) = &options.module_id {
            form.push(("module_id", module_id.clone()));
        }
        if let Some(date_begin) = options.date_begin {
            form.push(("date_begin", to_unix_seconds(date_begin).to_string()));
        }
        match options.date_end {
            Some(DateBound::Last) => form.push(("date_end", "last".to_string())),
            Some(DateBound::Timestamp(date_end)) => {
                form.push(("date_end", to_unix_seconds(date_end).to_string()));
            }
            None => {}
        }
        if let Some(limit) = options.limit {
            form.push(("limit", cap_limit(limit).to_string()));
        }
        if let Some(optimize) = options.optimize {
            form.push(("optimize", optimize.to_string()));
        }
        if let Some(real_time) = options.real_time {
            form.push(("real_time", real_time.to_string()));
        }

        let response: MeasureResponse = self.post_form("/api/getmeasure", form).await?;
        Ok(response.body)
    }

    /// Fetch the state of a thermostat module.
    pub async fn get_therm_state(&self, options: &ThermStateOptions) -> Result<Value> {
        options.validate()?;

        let form = vec![
            ("device_id", options.device_id.clone()),
            ("module_id", options.module_id.clone()),
        ];

        let response: ThermStateResponse = self.post_form("/api/getthermstate", form).await?;
        Ok(response.body)
    }

    /// Push a heating schedule to a thermostat.
    pub async fn set_sync_schedule(&self, options: &SyncScheduleOptions) -> Result<Value> {
        options.validate()?;

        let form = vec![
            ("device_id", options.device_id.clone()),
            ("module_id", options.module_id.clone()),
            ("zones", serde_json::to_string(&options.zones)?),
            ("timetable", serde_json::to_string(&options.timetable)?),
        ];

        let response: StatusResponse = self.post_form("/api/syncschedule", form).await?;
        Ok(response.status)
    }

    /// Change a thermostat's setpoint mode.
    pub async fn set_therm_point(&self, options: &SetThermPointOptions) -> Result<Value> {
        options.validate()?;

        let mut form = vec![
            ("device_id", options.device_id.clone()),
            ("module_id", options.module_id.clone()),
            ("setpoint_mode", options.setpoint_mode.clone()),
        ];

        if let Some(endtime) = options.setpoint_endtime {
            form.push(("setpoint_endtime", endtime.to_string()));
        }
        if let Some(temp) = options.setpoint_temp {
            form.push(("setpoint_temp", temp.to_string()));
        }

        let response: StatusResponse = self.post_form("/api/setthermpoint", form).await?;
        Ok(response.status)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        mut form: Vec<(&'static str, String)>,
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;
        form.insert(0, ("access_token", token));

        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", path);

        let response = self.http.post(&url).form(&form).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Request to {} failed with status {}", path, status);
            return Err(Error::Protocol(status.as_u16()));
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str::<T>(&text)?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("id", "secret", "user", "pass").unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = NetatmoClient::new(credentials());
        assert_eq!(client.base_url(), "https://api.netatmo.net");
    }

    #[test]
    fn test_client_with_custom_base_url() {
        let client = NetatmoClient::new_with_base_url(credentials(), "https://test.example.com/");
        assert_eq!(client.base_url(), "https://test.example.com");
    }

    #[tokio::test]
    async fn test_client_starts_unauthenticated() {
        let client = NetatmoClient::new(credentials());
        assert!(client.cached_access_token().await.is_none());
    }
}
