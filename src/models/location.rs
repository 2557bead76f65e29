use serde::Deserialize;

/// Coarse location of an IP address.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub country: String,
    pub region: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub isp: String,
}

/// Fields requested from ip-api.com.
pub const LOOKUP_FIELDS: &str = "status,message,country,regionName,city,lat,lon,timezone,isp";

/// Raw ip-api.com answer. On failure only `status` and `message` are set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpApiResponse {
    pub status: String,
    pub message: Option<String>,
    pub country: Option<String>,
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
}

impl IpApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn into_location(self) -> Option<ResolvedLocation> {
        if !self.is_success() {
            return None;
        }

        Some(ResolvedLocation {
            country: self.country.unwrap_or_default(),
            region: self.region_name.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            latitude: self.lat?,
            longitude: self.lon?,
            timezone: self.timezone.unwrap_or_default(),
            isp: self.isp.unwrap_or_default(),
        })
    }
}
