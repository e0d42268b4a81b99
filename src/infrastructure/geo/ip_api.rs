//! HTTP client for ip-api.com compatible lookup endpoints.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{GeoError, GeoLookup};
use crate::domain::geo::GeoData;

/// ip-api.com JSON response. Failures come back as HTTP 200 with
/// `"status": "fail"`.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    city: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl IpApiResponse {
    fn into_geo(self) -> Result<GeoData, GeoError> {
        if self.status.as_deref() == Some("fail") {
            return Err(GeoError::Failed(
                self.message.unwrap_or_else(|| "fail".to_string()),
            ));
        }

        Ok(GeoData {
            country_code: non_empty(self.country_code),
            country_name: non_empty(self.country),
            city: non_empty(self.city),
        })
    }
}

/// Lookup against a URL template such as
/// `http://ip-api.com/json/{ip}?fields=status,country,countryCode,city`.
pub struct IpApiClient {
    client: reqwest::Client,
    url_template: String,
}

impl IpApiClient {
    /// Creates a client. `timeout` bounds each HTTP request.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    fn url_for(&self, ip: IpAddr) -> String {
        self.url_template.replace("{ip}", &ip.to_string())
    }
}

#[async_trait]
impl GeoLookup for IpApiClient {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoData, GeoError> {
        let url = self.url_for(ip);
        trace!(%ip, "Requesting location");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeoError::Status(response.status().as_u16()));
        }

        response.json::<IpApiResponse>().await?.into_geo()
    }

    fn name(&self) -> &'static str {
        "ip-api"
    }
}
