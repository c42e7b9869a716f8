use serde::Deserialize;
use serde_json::Value;

// The API wraps successful responses in a top-level `{status, body}` object,
// but each endpoint projects out a different part of it, so every operation
// owns its own extraction struct rather than sharing an envelope.

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub body: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListBody {
    #[serde(default)]
    pub modules: Vec<Value>,
    #[serde(default)]
    pub devices: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceListResponse {
    pub body: DeviceListBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StationsDataResponse {
    pub body: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeasureResponse {
    pub body: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThermStateResponse {
    pub body: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_list_parsing() {
        let json = r#"{"status":"ok","body":{"modules":[{"_id":"02:00:00:00:00:01"}],"devices":[{"_id":"70:ee:50:00:00:01"}]}}"#;
        let response: DeviceListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.body.modules.len(), 1);
        assert_eq!(response.body.devices.len(), 1);
    }

    #[test]
    fn test_device_list_missing_sections_default_to_empty() {
        let json = r#"{"status":"ok","body":{}}"#;
        let response: DeviceListResponse = serde_json::from_str(json).unwrap();
        assert!(response.body.modules.is_empty());
        assert!(response.body.devices.is_empty());
    }

    #[test]
    fn test_status_response_parsing() {
        let json = r#"{"status":"ok"}"#;
        let response: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, Value::String("ok".to_string()));
    }
}
