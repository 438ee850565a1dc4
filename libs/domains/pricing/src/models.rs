use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{PricingError, PricingResult};

/// Billing hours in a month (~30.4 days * 24 hours)
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Flavors above this amount of memory (in MB) are considered high-memory
pub const HIGH_MEMORY_THRESHOLD_MB: i32 = 4096;

/// Zone used when a caller does not specify one (Paris)
pub const DEFAULT_ZONE: &str = "par";

/// Estimation id taken by the `/estimations/calculate` route
pub const RESERVED_ESTIMATION_ID: &str = "calculate";

/// A sized configuration of an instance type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Flavor {
    /// Flavor name, unique within its instance (e.g. "pico", "XS")
    pub name: String,
    /// Memory in megabytes
    pub memory_mb: i32,
    /// Number of virtual CPUs
    pub cpu_count: i32,
    /// Hourly price
    pub price_per_hour: f64,
    /// Whether the flavor can currently be provisioned
    pub available: bool,
}

impl Flavor {
    pub fn new(
        name: impl Into<String>,
        memory_mb: i32,
        cpu_count: i32,
        price_per_hour: f64,
        available: bool,
    ) -> Self {
        Self {
            name: name.into(),
            memory_mb,
            cpu_count,
            price_per_hour,
            available,
        }
    }

    /// Monthly price of a single running instance of this flavor
    pub fn monthly_price(&self) -> f64 {
        self.price_per_hour * HOURS_PER_MONTH
    }

    pub fn is_high_memory(&self) -> bool {
        self.memory_mb > HIGH_MEMORY_THRESHOLD_MB
    }
}

/// A compute offering (runtime type) with its flavors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Instance {
    /// Stable identifier of the offering, unique per catalog
    #[serde(rename = "type")]
    pub instance_type: String,
    pub name: String,
    pub version: String,
    /// Flavors in catalog order
    pub flavors: Vec<Flavor>,
}

impl Instance {
    pub fn new(
        instance_type: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            instance_type: instance_type.into(),
            name: name.into(),
            version: version.into(),
            flavors: Vec::new(),
        }
    }

    pub fn add_flavor(&mut self, flavor: Flavor) {
        self.flavors.push(flavor);
    }

    /// Builder-style variant of [`Instance::add_flavor`]
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.add_flavor(flavor);
        self
    }

    pub fn available_flavors(&self) -> impl Iterator<Item = &Flavor> {
        self.flavors.iter().filter(|f| f.available)
    }

    /// Find a flavor by name (first match in catalog order)
    pub fn find_flavor(&self, name: &str) -> Option<&Flavor> {
        self.flavors.iter().find(|f| f.name == name)
    }

    /// Cheapest monthly price among available flavors, 0 when none is available
    pub fn min_monthly_price(&self) -> f64 {
        self.available_flavors()
            .map(Flavor::monthly_price)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Most expensive monthly price among available flavors, 0 when none is available
    pub fn max_monthly_price(&self) -> f64 {
        self.available_flavors()
            .map(Flavor::monthly_price)
            .fold(0.0, f64::max)
    }
}

/// Cost line item for one runtime (instance type + flavor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RuntimeCost {
    pub runtime_id: String,
    pub display_name: String,
    /// Monthly cost at the minimum instance count
    pub min_cost: f64,
    /// Monthly cost at the maximum instance count
    pub max_cost: f64,
}

impl RuntimeCost {
    pub fn new(
        runtime_id: impl Into<String>,
        display_name: impl Into<String>,
        min_cost: f64,
        max_cost: f64,
    ) -> Self {
        Self {
            runtime_id: runtime_id.into(),
            display_name: display_name.into(),
            min_cost,
            max_cost,
        }
    }

    /// Line item for a flavor of an instance type, with ids derived from both names
    pub fn for_flavor(instance_type: &str, flavor_name: &str, min_cost: f64, max_cost: f64) -> Self {
        Self::new(
            format!("{}-{}", instance_type, flavor_name),
            format!("{} ({})", instance_type, flavor_name),
            min_cost,
            max_cost,
        )
    }
}

/// Cost line item for one addon plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AddonCost {
    pub addon_id: String,
    pub display_name: String,
    /// Monthly cost of the plan
    pub cost: f64,
}

impl AddonCost {
    pub fn new(addon_id: impl Into<String>, display_name: impl Into<String>, cost: f64) -> Self {
        Self {
            addon_id: addon_id.into(),
            display_name: display_name.into(),
            cost,
        }
    }

    pub fn for_plan(provider_id: &str, plan_id: &str, cost: f64) -> Self {
        Self::new(
            format!("{}-{}", provider_id, plan_id),
            format!("{} ({})", provider_id, plan_id),
            cost,
        )
    }
}

/// Cost estimation aggregate for a project.
///
/// The monthly totals are derived from the line items and kept in sync by
/// every mutation; they cannot be set from outside. Line items are
/// append-only. The aggregate owns all of its data, so `clone()` yields a
/// fully independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CostEstimation {
    id: String,
    project_id: String,
    min_monthly_cost: f64,
    max_monthly_cost: f64,
    runtime_costs: Vec<RuntimeCost>,
    addon_costs: Vec<AddonCost>,
}

impl CostEstimation {
    /// Create an empty estimation with a freshly generated id
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), project_id)
    }

    /// Create an empty estimation with a known id (e.g. when rehydrating from storage)
    pub fn with_id(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            min_monthly_cost: 0.0,
            max_monthly_cost: 0.0,
            runtime_costs: Vec::new(),
            addon_costs: Vec::new(),
        }
    }

    /// Rebuild an estimation from a transport payload.
    ///
    /// Totals are always recomputed from the line items. A payload without an
    /// id describes a new estimation and gets a fresh one. Line items with a
    /// negative cost and the reserved id are rejected.
    pub fn from_payload(payload: EstimationPayload) -> PricingResult<Self> {
        if payload.id == RESERVED_ESTIMATION_ID {
            return Err(PricingError::InvalidArgument(format!(
                "estimation ID {} is reserved",
                payload.id
            )));
        }

        let has_negative_cost = payload
            .runtime_costs
            .iter()
            .flat_map(|rc| [rc.min_cost, rc.max_cost])
            .chain(payload.addon_costs.iter().map(|ac| ac.cost))
            .any(|cost| !cost.is_finite() || cost < 0.0);
        if has_negative_cost {
            return Err(PricingError::InvalidArgument(
                "line item costs must be non-negative".to_string(),
            ));
        }

        let mut estimation = if payload.id.is_empty() {
            Self::new(payload.project_id)
        } else {
            Self::with_id(payload.id, payload.project_id)
        };
        estimation.runtime_costs = payload.runtime_costs;
        estimation.addon_costs = payload.addon_costs;
        estimation.recalculate_totals();
        Ok(estimation)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn min_monthly_cost(&self) -> f64 {
        self.min_monthly_cost
    }

    pub fn max_monthly_cost(&self) -> f64 {
        self.max_monthly_cost
    }

    pub fn runtime_costs(&self) -> &[RuntimeCost] {
        &self.runtime_costs
    }

    pub fn addon_costs(&self) -> &[AddonCost] {
        &self.addon_costs
    }

    pub fn add_runtime_cost(&mut self, cost: RuntimeCost) {
        self.runtime_costs.push(cost);
        self.recalculate_totals();
    }

    pub fn add_addon_cost(&mut self, cost: AddonCost) {
        self.addon_costs.push(cost);
        self.recalculate_totals();
    }

    pub fn total_runtime_min_cost(&self) -> f64 {
        self.runtime_costs.iter().map(|rc| rc.min_cost).sum()
    }

    pub fn total_runtime_max_cost(&self) -> f64 {
        self.runtime_costs.iter().map(|rc| rc.max_cost).sum()
    }

    pub fn total_addon_cost(&self) -> f64 {
        self.addon_costs.iter().map(|ac| ac.cost).sum()
    }

    fn recalculate_totals(&mut self) {
        let addons = self.total_addon_cost();
        self.min_monthly_cost = self.total_runtime_min_cost() + addons;
        self.max_monthly_cost = self.total_runtime_max_cost() + addons;
    }
}

/// Transport representation of an estimation submitted for saving.
///
/// Totals are not part of the payload; any extra fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EstimationPayload {
    /// Existing estimation id; empty or missing for a new estimation
    #[serde(default)]
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub runtime_costs: Vec<RuntimeCost>,
    #[serde(default)]
    pub addon_costs: Vec<AddonCost>,
}

/// A runtime to price: one flavor of an instance type, scaled between two instance counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RuntimeSpec {
    pub instance_type: String,
    pub flavor_name: String,
    /// Instance count at the low end of the scaling range
    pub min_instances: u32,
    /// Instance count at the high end of the scaling range
    pub max_instances: u32,
}

/// An addon plan to price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AddonSpec {
    pub provider_id: String,
    pub plan_id: String,
}

/// Command to compute a cost estimation for a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CalculateCostCommand {
    pub project_id: String,
    #[serde(default)]
    pub runtime_specs: Vec<RuntimeSpec>,
    #[serde(default)]
    pub addon_specs: Vec<AddonSpec>,
}

/// Query parameters for listing instances
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListInstancesQuery {
    /// Zone to list instances for (defaults to "par")
    pub zone_id: Option<String>,
}

/// Request body for saving an estimation
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SaveEstimationRequest {
    pub estimation: Option<EstimationPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveEstimationResponse {
    pub estimation_id: String,
}

/// Flavor as returned by the API, with derived prices
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FlavorResponse {
    pub name: String,
    pub memory_mb: i32,
    pub cpu_count: i32,
    pub price_per_hour: f64,
    pub available: bool,
    pub monthly_price: f64,
    pub is_high_memory: bool,
}

impl From<&Flavor> for FlavorResponse {
    fn from(flavor: &Flavor) -> Self {
        Self {
            name: flavor.name.clone(),
            memory_mb: flavor.memory_mb,
            cpu_count: flavor.cpu_count,
            price_per_hour: flavor.price_per_hour,
            available: flavor.available,
            monthly_price: flavor.monthly_price(),
            is_high_memory: flavor.is_high_memory(),
        }
    }
}

/// Instance as returned by the API, with its monthly price range
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstanceResponse {
    #[serde(rename = "type")]
    pub instance_type: String,
    pub name: String,
    pub version: String,
    pub flavors: Vec<FlavorResponse>,
    pub min_monthly_price: f64,
    pub max_monthly_price: f64,
}

impl From<&Instance> for InstanceResponse {
    fn from(instance: &Instance) -> Self {
        Self {
            instance_type: instance.instance_type.clone(),
            name: instance.name.clone(),
            version: instance.version.clone(),
            flavors: instance.flavors.iter().map(FlavorResponse::from).collect(),
            min_monthly_price: instance.min_monthly_price(),
            max_monthly_price: instance.max_monthly_price(),
        }
    }
}
