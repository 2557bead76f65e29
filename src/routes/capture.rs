use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::{ClientIp, UserAgent};
use crate::models::ack::CaptureAck;
use crate::models::capture::{Capture, CaptureEvent, DeviceInfo, LocationRequest, MISSING_COORDINATES};
use crate::service::capture::{CaptureService, DeliveryOutcome};
use crate::util::iso_timestamp;
use rocket::serde::json::Json;
use rocket::{State, post, routes};
use tracing::{debug, info, warn};

// The response never depends on the outcome.
fn log_outcome(outcome: DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Sent => debug!("capture relayed by email"),
        DeliveryOutcome::Disabled => debug!("capture relayed to logs only"),
        DeliveryOutcome::Failed(reason) => warn!(reason = %reason, "capture not relayed, responding with success anyway"),
    }
}

/// Legacy capture of browser geolocation coordinates.
#[post("/send-location", data = "<payload>")]
pub async fn send_location(
    capture: &State<CaptureService>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    payload: Option<JsonBody<LocationRequest>>,
) -> Result<Json<CaptureAck>, AppError> {
    let coordinates = match payload {
        Some(request) => request.coordinates()?,
        None => return Err(AppError::BadRequest(MISSING_COORDINATES.to_string())),
    };

    let record = Capture::new(CaptureEvent::Coordinates(coordinates), client_ip.0, user_agent.0);
    info!(
        timestamp = %iso_timestamp(&record.received_at),
        client_ip = ?record.client_ip,
        latitude = coordinates.latitude,
        longitude = coordinates.longitude,
        "location received"
    );

    log_outcome(capture.relay(&record).await);
    Ok(Json(CaptureAck::location()))
}

/// Capture of device details; the location is derived from the caller's IP.
#[post("/track-access", data = "<payload>")]
pub async fn track_access(
    capture: &State<CaptureService>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    payload: Option<JsonBody<DeviceInfo>>,
) -> Json<CaptureAck> {
    let device = payload.map(JsonBody::into_inner).unwrap_or_default();

    info!(
        client_ip = ?client_ip.0,
        user_agent = ?device.user_agent,
        platform = ?device.platform,
        language = ?device.language,
        timezone = ?device.timezone,
        screen_width = ?device.screen_width,
        screen_height = ?device.screen_height,
        referrer = ?device.referrer,
        "access tracked"
    );

    let record = Capture::new(CaptureEvent::Device(device), client_ip.0, user_agent.0);
    let timestamp = iso_timestamp(&record.received_at);

    log_outcome(capture.relay(&record).await);
    Json(CaptureAck::access(timestamp))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![send_location, track_access]
}
