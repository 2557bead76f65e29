use crate::config::{EmailConfig, GeolocationConfig};
use crate::models::capture::{Capture, CaptureEvent};
use crate::models::location::ResolvedLocation;
use crate::models::notification::Envelope;
use crate::service::email::{self, MailTransport, SmtpMailer};
use crate::service::geolocation::{IpApiLocator, IpLocator};
use crate::service::notification::assemble;
use crate::util::is_publicly_routable;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to the notification for one capture.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Mail is not configured; the capture was only logged.
    Disabled,
    Failed(String),
}

/// Mail transport plus the fixed addressing it sends with.
pub struct Mailer {
    pub transport: Arc<dyn MailTransport>,
    pub envelope: Envelope,
    pub display_tz: Tz,
}

pub struct Locator {
    pub inner: Arc<dyn IpLocator>,
    pub lookup_private_addresses: bool,
}

/// Relays captures to the operator. Built once at startup and shared
/// read-only by every request.
pub struct CaptureService {
    locator: Option<Locator>,
    mailer: Option<Mailer>,
}

fn display_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(e) => {
            warn!(timezone = %name, error = %e, "unknown display timezone, using UTC");
            chrono_tz::UTC
        }
    }
}

impl CaptureService {
    pub fn new(locator: Option<Locator>, mailer: Option<Mailer>) -> Self {
        Self { locator, mailer }
    }

    /// Build the production collaborators. Missing or invalid mail settings
    /// disable mail; only an HTTP client that cannot be built is an error.
    pub fn from_config(email_config: &EmailConfig, geolocation: &GeolocationConfig) -> Result<Self, reqwest::Error> {
        let locator = if geolocation.enabled {
            Some(Locator {
                inner: Arc::new(IpApiLocator::new(geolocation)?),
                lookup_private_addresses: geolocation.lookup_private_addresses,
            })
        } else {
            None
        };

        let mailer = if email_config.is_configured() {
            match (SmtpMailer::new(email_config), email::envelope(email_config)) {
                (Ok(transport), Ok(envelope)) => Some(Mailer {
                    transport: Arc::new(transport),
                    envelope,
                    display_tz: display_timezone(&email_config.display_timezone),
                }),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "email settings are invalid, notifications disabled");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::new(locator, mailer))
    }

    pub fn email_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    async fn resolve(&self, ip: Option<&str>) -> Option<ResolvedLocation> {
        let locator = self.locator.as_ref()?;
        let ip = ip?;

        if !locator.lookup_private_addresses && !is_publicly_routable(ip) {
            tracing::debug!(ip = %ip, "skipping lookup for non-routable address");
            return None;
        }

        match locator.inner.locate(ip).await {
            Ok(Some(location)) => {
                info!(
                    ip = %ip,
                    country = %location.country,
                    region = %location.region,
                    city = %location.city,
                    isp = %location.isp,
                    "resolved approximate location"
                );
                Some(location)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(ip = %ip, error = ?e, "IP lookup failed");
                None
            }
        }
    }

    /// Resolve, compose and send the notification for `capture`.
    ///
    /// Never fails: every downstream problem is logged and reported through
    /// the returned outcome.
    pub async fn relay(&self, capture: &Capture) -> DeliveryOutcome {
        let location = match capture.event {
            CaptureEvent::Device(_) => self.resolve(capture.client_ip.as_deref()).await,
            CaptureEvent::Coordinates(_) => None,
        };

        let Some(mailer) = &self.mailer else {
            info!("email not configured, capture logged only");
            return DeliveryOutcome::Disabled;
        };

        let notification = assemble(capture, location.as_ref(), &mailer.envelope, mailer.display_tz);
        match mailer.transport.send(&notification).await {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => {
                warn!(error = %e, to = %notification.to, "failed to send notification email");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture::{Coordinates, DeviceInfo};
    use crate::test_utils::{FailingLocator, FailingMailer, RecordingMailer, StaticLocator, mailer, sample_location};

    fn device_capture(ip: &str) -> Capture {
        Capture::new(CaptureEvent::Device(DeviceInfo::default()), Some(ip.to_string()), None)
    }

    fn locator(inner: Arc<dyn IpLocator>) -> Option<Locator> {
        Some(Locator {
            inner,
            lookup_private_addresses: false,
        })
    }

    #[tokio::test]
    async fn test_disabled_mail_skips_transport() {
        let service = CaptureService::new(None, None);
        let capture = Capture::new(CaptureEvent::Coordinates(Coordinates { latitude: -23.5, longitude: -46.6 }), None, None);

        assert!(!service.email_enabled());
        assert_eq!(service.relay(&capture).await, DeliveryOutcome::Disabled);
    }

    #[tokio::test]
    async fn test_device_capture_includes_resolved_location() {
        let recorder = Arc::new(RecordingMailer::default());
        let lookups = Arc::new(StaticLocator::new(Some(sample_location())));
        let service = CaptureService::new(locator(lookups.clone()), Some(mailer(recorder.clone())));

        assert_eq!(service.relay(&device_capture("8.8.8.8")).await, DeliveryOutcome::Sent);

        let sent = recorder.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html_body.contains("Localização Aproximada"));
        assert_eq!(lookups.calls().await, vec!["8.8.8.8".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_failure_omits_location() {
        let recorder = Arc::new(RecordingMailer::default());
        let service = CaptureService::new(locator(Arc::new(FailingLocator)), Some(mailer(recorder.clone())));

        assert_eq!(service.relay(&device_capture("8.8.8.8")).await, DeliveryOutcome::Sent);

        let sent = recorder.sent().await;
        assert!(!sent[0].html_body.contains("Localização Aproximada"));
        assert!(!sent[0].html_body.contains("null"));
    }

    #[tokio::test]
    async fn test_private_addresses_are_not_looked_up() {
        let lookups = Arc::new(StaticLocator::new(Some(sample_location())));
        let service = CaptureService::new(locator(lookups.clone()), None);

        let _ = service.relay(&device_capture("192.168.0.10")).await;
        assert!(lookups.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_private_lookup_can_be_enabled() {
        let lookups = Arc::new(StaticLocator::new(None));
        let service = CaptureService::new(
            Some(Locator {
                inner: lookups.clone(),
                lookup_private_addresses: true,
            }),
            None,
        );

        let _ = service.relay(&device_capture("127.0.0.1")).await;
        assert_eq!(lookups.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_coordinate_capture_never_looks_up() {
        let lookups = Arc::new(StaticLocator::new(Some(sample_location())));
        let recorder = Arc::new(RecordingMailer::default());
        let service = CaptureService::new(locator(lookups.clone()), Some(mailer(recorder.clone())));
        let capture = Capture::new(
            CaptureEvent::Coordinates(Coordinates { latitude: 1.0, longitude: 2.0 }),
            Some("8.8.8.8".to_string()),
            None,
        );

        assert_eq!(service.relay(&capture).await, DeliveryOutcome::Sent);
        assert!(lookups.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_raised() {
        let service = CaptureService::new(None, Some(mailer(Arc::new(FailingMailer))));
        let outcome = service.relay(&device_capture("8.8.8.8")).await;
        assert!(matches!(outcome, DeliveryOutcome::Failed(message) if message.contains("smtp unavailable")));
    }

    #[test]
    fn test_from_config_without_credentials_disables_mail() {
        let service = CaptureService::from_config(&EmailConfig::default(), &GeolocationConfig::default()).unwrap();
        assert!(!service.email_enabled());
    }

    #[test]
    fn test_from_config_with_invalid_address_disables_mail() {
        let email_config = EmailConfig {
            username: Some("not an address".to_string()),
            password: Some("secret".to_string()),
            recipient: Some("ops@example.com".to_string()),
            ..EmailConfig::default()
        };
        let service = CaptureService::from_config(&email_config, &GeolocationConfig::default()).unwrap();
        assert!(!service.email_enabled());
    }

    #[test]
    fn test_unknown_display_timezone_falls_back_to_utc() {
        assert_eq!(display_timezone("Mars/Olympus_Mons"), chrono_tz::UTC);
        assert_eq!(display_timezone("America/Sao_Paulo"), chrono_tz::America::Sao_Paulo);
    }
}
