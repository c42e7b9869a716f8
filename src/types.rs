use chrono::DateTime;
use serde_json::Value;

use crate::error::{Error, Result};

/// Default OAuth2 scope requested during the password grant.
pub const DEFAULT_SCOPE: &str = "read_station read_thermostat write_thermostat";

/// Largest number of measurements the API returns per request.
pub const MAX_MEASURE_LIMIT: u32 = 1024;

/// Account credentials for the OAuth2 password grant.
///
/// Immutable after construction; every required field is checked up front so
/// that a misconfigured client fails before any network activity.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub scope: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            scope: DEFAULT_SCOPE.to_string(),
        };

        require(&credentials.client_id, "client_id", Error::Config)?;
        require(&credentials.client_secret, "client_secret", Error::Config)?;
        require(&credentials.username, "username", Error::Config)?;
        require(&credentials.password, "password", Error::Config)?;

        Ok(credentials)
    }

    /// Override the default scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Options for the device list endpoint.
#[derive(Debug, Clone, Default)]
pub struct DeviceListOptions {
    pub app_type: Option<String>,
}

/// Options for the stations data endpoint.
#[derive(Debug, Clone, Default)]
pub struct StationsDataOptions {
    pub app_type: Option<String>,
}

/// The measurement types requested from the measure endpoint.
///
/// The API wants a lower-case comma-joined list; callers can hand over either
/// a pre-joined string or a list of names and both normalize identically.
#[derive(Debug, Clone)]
pub enum TypeFilter {
    Joined(String),
    List(Vec<String>),
}

impl TypeFilter {
    /// Lower-cased, whitespace-stripped, comma-joined form for transmission.
    pub fn normalized(&self) -> String {
        let joined = match self {
            TypeFilter::Joined(value) => value.clone(),
            TypeFilter::List(values) => values.join(","),
        };
        joined
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    fn is_empty(&self) -> bool {
        match self {
            TypeFilter::Joined(value) => value.trim().is_empty(),
            TypeFilter::List(values) => values.is_empty(),
        }
    }
}

impl From<&str> for TypeFilter {
    fn from(value: &str) -> Self {
        TypeFilter::Joined(value.to_string())
    }
}

impl From<Vec<&str>> for TypeFilter {
    fn from(values: Vec<&str>) -> Self {
        TypeFilter::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TypeFilter {
    fn from(values: Vec<String>) -> Self {
        TypeFilter::List(values)
    }
}

/// Upper bound of a measurement query.
///
/// `Last` is the API's literal `"last"` sentinel and bypasses timestamp
/// normalization entirely.
#[derive(Debug, Clone, Copy)]
pub enum DateBound {
    Timestamp(i64),
    Last,
}

/// Options for the measure endpoint.
#[derive(Debug, Clone)]
pub struct GetMeasureOptions {
    pub device_id: String,
    pub scale: String,
    pub types: TypeFilter,
    pub module_id: Option<String>,
    pub date_begin: Option<i64>,
    pub date_end: Option<DateBound>,
    pub limit: Option<u32>,
    pub optimize: Option<bool>,
    pub real_time: Option<bool>,
}

impl GetMeasureOptions {
    pub fn new(
        device_id: impl Into<String>,
        scale: impl Into<String>,
        types: impl Into<TypeFilter>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            scale: scale.into(),
            types: types.into(),
            module_id: None,
            date_begin: None,
            date_end: None,
            limit: None,
            optimize: None,
            real_time: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require(&self.device_id, "device_id", Error::Validation)?;
        require(&self.scale, "scale", Error::Validation)?;
        if self.types.is_empty() {
            return Err(Error::Validation("'type' not set".to_string()));
        }
        Ok(())
    }
}

/// Options for the thermostat state endpoint.
#[derive(Debug, Clone)]
pub struct ThermStateOptions {
    pub device_id: String,
    pub module_id: String,
}

impl ThermStateOptions {
    pub fn new(device_id: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            module_id: module_id.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require(&self.device_id, "device_id", Error::Validation)?;
        require(&self.module_id, "module_id", Error::Validation)
    }
}

/// Options for pushing a thermostat schedule.
///
/// `zones` and `timetable` are passed through as JSON; the API defines their
/// shape and the client does not inspect them.
#[derive(Debug, Clone)]
pub struct SyncScheduleOptions {
    pub device_id: String,
    pub module_id: String,
    pub zones: Value,
    pub timetable: Value,
}

impl SyncScheduleOptions {
    pub fn new(
        device_id: impl Into<String>,
        module_id: impl Into<String>,
        zones: Value,
        timetable: Value,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            module_id: module_id.into(),
            zones,
            timetable,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require(&self.device_id, "device_id", Error::Validation)?;
        require(&self.module_id, "module_id", Error::Validation)?;
        if self.zones.is_null() {
            return Err(Error::Validation("'zones' not set".to_string()));
        }
        if self.timetable.is_null() {
            return Err(Error::Validation("'timetable' not set".to_string()));
        }
        Ok(())
    }
}

/// Options for changing a thermostat setpoint.
#[derive(Debug, Clone)]
pub struct SetThermPointOptions {
    pub device_id: String,
    pub module_id: String,
    pub setpoint_mode: String,
    pub setpoint_endtime: Option<i64>,
    pub setpoint_temp: Option<f64>,
}

impl SetThermPointOptions {
    pub fn new(
        device_id: impl Into<String>,
        module_id: impl Into<String>,
        setpoint_mode: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            module_id: module_id.into(),
            setpoint_mode: setpoint_mode.into(),
            setpoint_endtime: None,
            setpoint_temp: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require(&self.device_id, "device_id", Error::Validation)?;
        require(&self.module_id, "module_id", Error::Validation)?;
        require(&self.setpoint_mode, "setpoint_mode", Error::Validation)
    }
}

fn require(value: &str, name: &str, kind: fn(String) -> Error) -> Result<()> {
    if value.trim().is_empty() {
        Err(kind(format!("'{}' not set", name)))
    } else {
        Ok(())
    }
}

/// Convert a seconds-or-milliseconds timestamp to the Unix seconds the API
/// expects. Values at or below ten billion look like seconds and are scaled
/// up before conversion.
pub(crate) fn to_unix_seconds(value: i64) -> i64 {
    let millis = if value <= 10_000_000_000 {
        value.saturating_mul(1000)
    } else {
        value
    };
    DateTime::from_timestamp_millis(millis)
        .map_or_else(|| millis.div_euclid(1000), |dt| dt.timestamp())
}

/// Cap a measurement limit at the API maximum.
pub(crate) fn cap_limit(limit: u32) -> u32 {
    limit.min(MAX_MEASURE_LIMIT)
}
