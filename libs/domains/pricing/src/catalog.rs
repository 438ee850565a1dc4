use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{PricingError, PricingResult};
use crate::models::{Instance, DEFAULT_ZONE};

/// Source of instance types, flavors and their hourly prices.
///
/// Implementations can use different backends (Clever Cloud API, static data, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricingCatalog: Send + Sync {
    /// Zone searched by instance and flavor lookups
    fn default_zone(&self) -> &str;

    /// List all instances offered in a zone, in catalog order
    async fn list_instances(&self, zone_id: &str) -> PricingResult<Vec<Instance>>;

    /// Get an instance by its type from the default zone
    async fn get_instance_by_type(&self, instance_type: &str) -> PricingResult<Instance> {
        self.list_instances(self.default_zone())
            .await?
            .into_iter()
            .find(|i| i.instance_type == instance_type)
            .ok_or_else(|| {
                PricingError::NotFound(format!("instance type {} not found", instance_type))
            })
    }

    /// Get the hourly price of a flavor of an instance type
    async fn get_flavor_price(&self, instance_type: &str, flavor_name: &str) -> PricingResult<f64> {
        let instance = self.get_instance_by_type(instance_type).await?;
        flavor_price(&instance, flavor_name)
    }
}

/// Resolve a flavor's hourly price within an already fetched instance
fn flavor_price(instance: &Instance, flavor_name: &str) -> PricingResult<f64> {
    instance
        .find_flavor(flavor_name)
        .map(|f| f.price_per_hour)
        .ok_or_else(|| {
            PricingError::NotFound(format!(
                "flavor {} not found for instance type {}",
                flavor_name, instance.instance_type
            ))
        })
}

/// In-memory catalog with fixed instances per zone (for development/testing)
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    zones: HashMap<String, Vec<Instance>>,
    default_zone: String,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            zones: HashMap::new(),
            default_zone: DEFAULT_ZONE.to_string(),
        }
    }

    /// Register the instances offered in a zone, replacing any previous ones
    pub fn with_zone(mut self, zone_id: impl Into<String>, instances: Vec<Instance>) -> Self {
        self.zones.insert(zone_id.into(), instances);
        self
    }

    /// Zone searched by [`PricingCatalog::get_instance_by_type`]
    pub fn with_default_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.default_zone = zone_id.into();
        self
    }
}

#[async_trait]
impl PricingCatalog for StaticCatalog {
    fn default_zone(&self) -> &str {
        &self.default_zone
    }

    async fn list_instances(&self, zone_id: &str) -> PricingResult<Vec<Instance>> {
        Ok(self.zones.get(zone_id).cloned().unwrap_or_default())
    }
}
