use crate::error::app_error::AppError;
use crate::models::lenient;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const MISSING_COORDINATES: &str = "Latitude e longitude são obrigatórias.";

/// Device coordinates reported by the legacy capture page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Body of `POST /send-location`.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LocationRequest {
    #[serde(deserialize_with = "lenient::coordinate")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::coordinate")]
    pub longitude: Option<f64>,
}

impl LocationRequest {
    pub fn coordinates(&self) -> Result<Coordinates, AppError> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(AppError::BadRequest(MISSING_COORDINATES.to_string())),
        }
    }
}

/// Browser and device details posted to `POST /track-access`.
///
/// Every field is optional; values of the wrong JSON type are coerced or
/// dropped rather than rejected.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(deserialize_with = "lenient::text")]
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub platform: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub language: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub timezone: Option<String>,
    #[serde(deserialize_with = "lenient::dimension")]
    pub screen_width: Option<u32>,
    #[serde(deserialize_with = "lenient::dimension")]
    pub screen_height: Option<u32>,
    #[serde(deserialize_with = "lenient::dimension")]
    pub window_width: Option<u32>,
    #[serde(deserialize_with = "lenient::dimension")]
    pub window_height: Option<u32>,
    #[serde(deserialize_with = "lenient::text")]
    pub referrer: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub on_line: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub cookie_enabled: bool,
}

impl DeviceInfo {
    /// Referrer, treating an empty string as a direct visit.
    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref().filter(|r| !r.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Coordinates(Coordinates),
    Device(DeviceInfo),
}

/// One capture as received by the HTTP layer.
#[derive(Debug, Clone)]
pub struct Capture {
    pub event: CaptureEvent,
    pub client_ip: Option<String>,
    /// `User-Agent` request header, used when the body carries none.
    pub user_agent: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Capture {
    pub fn new(event: CaptureEvent, client_ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            event,
            client_ip,
            user_agent,
            received_at: Utc::now(),
        }
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        match &self.event {
            CaptureEvent::Device(info) => Some(info),
            CaptureEvent::Coordinates(_) => None,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match &self.event {
            CaptureEvent::Coordinates(coordinates) => Some(*coordinates),
            CaptureEvent::Device(_) => None,
        }
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.device()
            .and_then(|info| info.user_agent.as_deref())
            .or(self.user_agent.as_deref())
            .filter(|ua| !ua.trim().is_empty())
    }
}
