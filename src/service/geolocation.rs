use crate::config::GeolocationConfig;
use crate::error::app_error::AppError;
use crate::models::location::{IpApiResponse, LOOKUP_FIELDS, ResolvedLocation};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Resolves an IP address to a coarse location.
///
/// `Ok(None)` means the service could not place the address; errors are
/// transport or decoding failures.
#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<Option<ResolvedLocation>, AppError>;
}

/// ip-api.com client.
pub struct IpApiLocator {
    http_client: HttpClient,
    base_url: String,
}

impl IpApiLocator {
    pub fn new(config: &GeolocationConfig) -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn lookup_url(&self, ip: &str) -> String {
        format!("{}/{}?fields={}", self.base_url, urlencoding::encode(ip.trim()), LOOKUP_FIELDS)
    }
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self, ip: &str) -> Result<Option<ResolvedLocation>, AppError> {
        let response: IpApiResponse = self
            .http_client
            .get(self.lookup_url(ip))
            .send()
            .await
            .map_err(|e| AppError::geolocation("request to lookup service failed", e))?
            .json()
            .await
            .map_err(|e| AppError::geolocation("invalid lookup response", e))?;

        if !response.is_success() {
            tracing::debug!(ip = %ip, message = ?response.message, "lookup service could not place address");
        }

        Ok(response.into_location())
    }
}
