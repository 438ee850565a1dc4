//! Clever Cloud Catalog Client
//!
//! Fetches instance types and flavor prices from the Clever Cloud products API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::PricingCatalog;
use crate::error::{PricingError, PricingResult};
use crate::models::{Flavor, Instance, DEFAULT_ZONE};

/// Default timeout for calls to the products API
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Product entry from the Clever Cloud API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProduct {
    #[serde(rename = "type")]
    pub product_type: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub flavors: Vec<ApiFlavor>,
}

/// Flavor entry from the Clever Cloud API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFlavor {
    pub name: String,
    #[serde(default)]
    pub mem: i32,
    #[serde(default)]
    pub cpus: i32,
    /// Hourly price
    #[serde(default)]
    pub price: f64,
}

impl From<ApiProduct> for Instance {
    fn from(product: ApiProduct) -> Self {
        let mut instance = Instance::new(product.product_type, product.name, product.version);
        for flavor in product.flavors {
            // Everything listed by the API can be provisioned
            instance.add_flavor(Flavor::new(flavor.name, flavor.mem, flavor.cpus, flavor.price, true));
        }
        instance
    }
}

/// Pricing catalog backed by the Clever Cloud products API
#[derive(Debug, Clone)]
pub struct CleverCloudCatalog {
    client: Client,
    api_url: String,
    default_zone: String,
}

impl CleverCloudCatalog {
    pub const DEFAULT_API_URL: &'static str = "https://api.clever-cloud.com/v4";
    const USER_AGENT: &'static str = "hosting-cost-estimator";

    /// Create a client for `api_url` whose requests give up after `timeout`
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> PricingResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(Self::USER_AGENT)
            .build()
            .map_err(|e| PricingError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            default_zone: DEFAULT_ZONE.to_string(),
        })
    }

    /// Zone searched by [`PricingCatalog::get_instance_by_type`]
    pub fn with_default_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.default_zone = zone_id.into();
        self
    }

    fn instances_url(&self) -> String {
        format!("{}/products/instances", self.api_url)
    }
}

#[async_trait]
impl PricingCatalog for CleverCloudCatalog {
    fn default_zone(&self) -> &str {
        &self.default_zone
    }

    async fn list_instances(&self, zone_id: &str) -> PricingResult<Vec<Instance>> {
        info!(zone_id = zone_id, "Fetching Clever Cloud instances");

        let response = self
            .client
            .get(self.instances_url())
            .query(&[("zone_id", zone_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                zone_id = zone_id,
                "Clever Cloud API returned non-success status"
            );
            return Err(PricingError::UpstreamUnavailable(format!(
                "unexpected status code: {}",
                response.status().as_u16()
            )));
        }

        let products: Vec<ApiProduct> = response.json().await?;
        debug!(count = products.len(), zone_id = zone_id, "Decoded Clever Cloud products");

        Ok(products.into_iter().map(Instance::from).collect())
    }

}
