use crate::config::Config;
use crate::errors::{DashboardError, Result};
use crate::models::geo::{Address, GeoPoint};
use crate::providers::Geocoder;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

/// OpenCage forward geocoder
pub struct OpenCage {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl OpenCage {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(DashboardError::RequestError)?;

        Ok(Self {
            client,
            url: config.opencage_url.clone(),
            api_key: config.opencage_api_key.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for OpenCage {
    fn name(&self) -> &'static str {
        "opencage"
    }

    async fn locate(&self, address: &Address) -> Result<Option<GeoPoint>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DashboardError::ConfigError("OPENCAGE_API_KEY is not set".to_string()))?;

        let query = address.lookup_text();
        debug!("Geocoding {}", query);

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query.as_str()),
                ("key", key),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await
            .map_err(DashboardError::RequestError)?;

        if !response.status().is_success() {
            warn!("Geocoding {} failed: HTTP status {}", query, response.status());
            return Ok(None);
        }

        let body = response.text().await?;
        match serde_json::from_str::<Value>(&body) {
            Ok(json) => Ok(parse_geocode(&json)),
            Err(e) => {
                warn!("Malformed geocoding response for {}: {}", query, e);
                Ok(None)
            }
        }
    }
}

/// First result's geometry, if any.
pub fn parse_geocode(json: &Value) -> Option<GeoPoint> {
    let geometry = json.get("results")?.as_array()?.first()?.get("geometry")?;
    Some(GeoPoint {
        latitude: geometry.get("lat")?.as_f64()?,
        longitude: geometry.get("lng")?.as_f64()?,
    })
}
