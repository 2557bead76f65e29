use crate::config::{Config, EmailConfig};
use crate::error::app_error::AppError;
use crate::models::location::ResolvedLocation;
use crate::models::notification::{Envelope, Notification, Sender};
use crate::service::capture::Mailer;
use crate::service::email::MailTransport;
use crate::service::geolocation::IpLocator;
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn sample_location() -> ResolvedLocation {
    ResolvedLocation {
        country: "Brazil".to_string(),
        region: "São Paulo".to_string(),
        city: "São Paulo".to_string(),
        latitude: -23.5475,
        longitude: -46.6361,
        timezone: "America/Sao_Paulo".to_string(),
        isp: "Example Telecom".to_string(),
    }
}

pub fn mailer(transport: Arc<dyn MailTransport>) -> Mailer {
    Mailer {
        transport,
        envelope: Envelope {
            sender: Sender {
                name: "Tracker".to_string(),
                address: "tracker@example.com".to_string(),
            },
            recipient: "ops@example.com".to_string(),
        },
        display_tz: chrono_tz::America::Sao_Paulo,
    }
}

/// Configuration with mail credentials and no network-facing features.
pub fn test_config(with_email: bool) -> Config {
    let mut config = Config::default();
    config.geolocation.enabled = false;
    config.assets.enabled = false;
    if with_email {
        config.email = EmailConfig {
            username: Some("tracker@example.com".to_string()),
            password: Some("secret".to_string()),
            recipient: Some("ops@example.com".to_string()),
            ..EmailConfig::default()
        };
    }
    config
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingMailer {
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait::async_trait]
impl MailTransport for FailingMailer {
    async fn send(&self, _notification: &Notification) -> Result<(), AppError> {
        Err(AppError::email("smtp unavailable"))
    }
}

pub struct StaticLocator {
    location: Option<ResolvedLocation>,
    calls: Mutex<Vec<String>>,
}

impl StaticLocator {
    pub fn new(location: Option<ResolvedLocation>) -> Self {
        Self {
            location,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl IpLocator for StaticLocator {
    async fn locate(&self, ip: &str) -> Result<Option<ResolvedLocation>, AppError> {
        self.calls.lock().await.push(ip.to_string());
        Ok(self.location.clone())
    }
}

pub struct FailingLocator;

#[async_trait::async_trait]
impl IpLocator for FailingLocator {
    async fn locate(&self, _ip: &str) -> Result<Option<ResolvedLocation>, AppError> {
        // An unparseable URL fails inside reqwest without touching the network.
        let err = match reqwest::Client::new().get("not a url").send().await {
            Err(err) => err,
            Ok(_) => unreachable!("relative URL cannot be sent"),
        };
        Err(AppError::geolocation("request to lookup service failed", err))
    }
}

/// In-memory log sink for asserting on `tracing` output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
