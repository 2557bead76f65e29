use capture_relay::{Config, build_rocket, init_tracing};
use rocket::{Build, Rocket};

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.json_format);
    tracing::info!(email_configured = config.email.is_configured(), "configuration loaded");

    build_rocket(config)
}
