pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod types;

pub use auth::{AuthEvent, TokenManager};
pub use client::NetatmoClient;
pub use error::{Error, Result};
pub use types::{
    Credentials, DateBound, DeviceListOptions, GetMeasureOptions, SetThermPointOptions,
    StationsDataOptions, SyncScheduleOptions, ThermStateOptions, TypeFilter,
};
