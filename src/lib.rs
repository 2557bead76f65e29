mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod service;
mod util;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::config::{AssetsConfig, CorsConfig, EmailConfig, GeolocationConfig};
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::capture::CaptureService;
use rocket::fairing::AdHoc;
use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use tracing_subscriber::EnvFilter;

pub fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=capture_relay=debug,rocket=warn
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn build_cors(cors_config: &CorsConfig) -> Result<CorsOptions, String> {
    let is_wildcard = cors_config.allowed_origins.iter().any(|origin| origin == "*");

    if is_wildcard && cors_config.allow_credentials {
        return Err("cannot use wildcard origins (*) with credentials enabled; set specific origins or disable credentials".to_string());
    }

    let allowed_origins = if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    Ok(CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept"]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    })
}

fn attach_cors(rocket: Rocket<Build>, cors_config: &CorsConfig) -> Rocket<Build> {
    match build_cors(cors_config).and_then(|options| options.to_cors().map_err(|e| e.to_string())) {
        Ok(cors) => rocket.attach(cors),
        Err(e) => rocket.attach(AdHoc::try_on_ignite("CORS", |rocket| async move {
            tracing::error!("Invalid CORS configuration: {}", e);
            Err(rocket)
        })),
    }
}

fn stage_capture(email: EmailConfig, geolocation: GeolocationConfig) -> AdHoc {
    AdHoc::try_on_ignite("Capture relay", |rocket| async move {
        match CaptureService::from_config(&email, &geolocation) {
            Ok(service) => {
                tracing::info!(
                    email_enabled = service.email_enabled(),
                    geolocation_enabled = geolocation.enabled,
                    "Capture relay initialized"
                );
                Ok(rocket.manage(service))
            }
            Err(e) => {
                tracing::error!("Failed to initialize IP lookup client: {}", e);
                Err(rocket)
            }
        }
    })
}

fn stage_banner() -> AdHoc {
    AdHoc::on_liftoff("Startup banner", |rocket| {
        Box::pin(async move {
            let config = rocket.config();
            let email_enabled = rocket.state::<CaptureService>().is_some_and(CaptureService::email_enabled);
            tracing::info!(
                address = %config.address,
                port = config.port,
                email_configured = email_enabled,
                "capture relay listening"
            );
        })
    })
}

fn mount_assets(rocket: Rocket<Build>, assets: &AssetsConfig) -> Rocket<Build> {
    if !assets.enabled {
        return rocket;
    }

    // Missing lets the service start before the page is deployed.
    rocket.mount("/", FileServer::new(&assets.dir, Options::Index | Options::Missing))
}

fn base_rocket(config: Config) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    let rocket = attach_cors(rocket::custom(figment), &config.cors)
        .attach(RequestLogger)
        .attach(stage_banner())
        .mount("/", app_routes::capture::routes())
        .mount("/", app_routes::health::routes())
        .register(
            "/",
            catchers![
                app_routes::error::bad_request,
                app_routes::error::not_found,
                app_routes::error::internal_error
            ],
        );

    mount_assets(rocket, &config.assets).manage(config)
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    let capture = stage_capture(config.email.clone(), config.geolocation.clone());
    base_rocket(config).attach(capture)
}

/// Rocket with a pre-built capture service instead of the configured collaborators.
#[cfg(test)]
pub(crate) fn build_rocket_with(config: Config, service: CaptureService) -> Rocket<Build> {
    base_rocket(config).manage(service)
}
