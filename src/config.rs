use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "CaptureRelay.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub email: EmailConfig,
    pub geolocation: GeolocationConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Outbound mail settings. Mail is only sent when `username`, `password`
/// and `recipient` are all present.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
    pub from_name: String,
    /// IANA zone used for the human readable date in notifications.
    pub display_timezone: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub lookup_private_addresses: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssetsConfig {
    pub enabled: bool,
    pub dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            username: None,
            password: None,
            recipient: None,
            from_name: "🎯 Sistema PIX Tracker".to_string(),
            display_timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://ip-api.com/json".to_string(),
            timeout_seconds: 10,
            lookup_private_addresses: false,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "public".to_string(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl EmailConfig {
    pub fn username(&self) -> Option<&str> {
        non_blank(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        non_blank(&self.password)
    }

    pub fn recipient(&self) -> Option<&str> {
        non_blank(&self.recipient)
    }

    pub fn is_configured(&self) -> bool {
        self.username().is_some() && self.password().is_some() && self.recipient().is_some()
    }
}

impl Config {
    /// Layered configuration sources, lowest priority first:
    /// 1. built-in defaults
    /// 2. CaptureRelay.toml, if present
    /// 3. environment variables prefixed with RELAY_ (e.g. RELAY_EMAIL__SMTP_HOST)
    /// 4. EMAIL_USER, EMAIL_PASS, EMAIL_TO and PORT for compatibility with existing deployments
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("RELAY_").split("__"))
            .merge(Env::raw().only(&["EMAIL_USER"]).map(|_| "email.username".into()))
            .merge(Env::raw().only(&["EMAIL_PASS"]).map(|_| "email.password".into()))
            .merge(Env::raw().only(&["EMAIL_TO"]).map(|_| "email.recipient".into()))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
