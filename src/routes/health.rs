use crate::config::Config;
use crate::middleware::ClientIp;
use crate::models::health::HealthResponse;
use crate::util::iso_timestamp;
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{State, get, routes};

#[get("/health")]
pub async fn healthcheck(config: &State<Config>, client_ip: ClientIp) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: iso_timestamp(&Utc::now()),
        email_configured: config.email.is_configured(),
        ip: client_ip.0,
    })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![healthcheck]
}
