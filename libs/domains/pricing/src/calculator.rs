//! Cost Calculator
//!
//! Turns runtime and addon specifications into a priced [`CostEstimation`].

use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::PricingCatalog;
use crate::error::{PricingError, PricingResult};
use crate::models::{
    AddonCost, AddonSpec, CalculateCostCommand, CostEstimation, RuntimeCost, RuntimeSpec,
    HOURS_PER_MONTH,
};

/// Calculator pricing estimations against a catalog
pub struct CostCalculator<C: PricingCatalog> {
    catalog: Arc<C>,
}

impl<C: PricingCatalog> Clone for CostCalculator<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C: PricingCatalog> CostCalculator<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Build a fully priced estimation for the command.
    ///
    /// Runtimes are priced in input order and the first lookup failure aborts
    /// the whole calculation. Each call produces a new estimation id.
    pub async fn calculate(&self, command: &CalculateCostCommand) -> PricingResult<CostEstimation> {
        let mut estimation = CostEstimation::new(command.project_id.as_str());

        for spec in &command.runtime_specs {
            let hourly_price = self
                .catalog
                .get_flavor_price(&spec.instance_type, &spec.flavor_name)
                .await
                .map_err(|e| lookup_error(spec, e))?;

            estimation.add_runtime_cost(runtime_cost(spec, hourly_price));
        }

        for spec in &command.addon_specs {
            estimation.add_addon_cost(addon_cost(spec));
        }

        debug!(
            estimation_id = %estimation.id(),
            project_id = %estimation.project_id(),
            runtimes = estimation.runtime_costs().len(),
            addons = estimation.addon_costs().len(),
            "Calculated estimation"
        );

        Ok(estimation)
    }
}

/// Price one runtime spec at the given hourly price.
///
/// Instance counts are not reordered: an inverted range yields `min_cost > max_cost`.
pub fn runtime_cost(spec: &RuntimeSpec, hourly_price: f64) -> RuntimeCost {
    if spec.min_instances > spec.max_instances {
        warn!(
            instance_type = %spec.instance_type,
            flavor_name = %spec.flavor_name,
            min_instances = spec.min_instances,
            max_instances = spec.max_instances,
            "Runtime spec has more minimum than maximum instances"
        );
    }

    let monthly_price = hourly_price * HOURS_PER_MONTH;
    let min_cost = monthly_price * f64::from(spec.min_instances);
    let max_cost = monthly_price * f64::from(spec.max_instances);

    RuntimeCost::for_flavor(&spec.instance_type, &spec.flavor_name, min_cost, max_cost)
}

/// Price one addon spec.
///
/// No pricing source exists for addons yet, so every plan costs 0.
pub fn addon_cost(spec: &AddonSpec) -> AddonCost {
    AddonCost::for_plan(&spec.provider_id, &spec.plan_id, 0.0)
}

fn lookup_error(spec: &RuntimeSpec, err: PricingError) -> PricingError {
    match err {
        PricingError::NotFound(reason) | PricingError::InvalidArgument(reason) => {
            PricingError::PricingLookupFailed {
                instance_type: spec.instance_type.clone(),
                flavor_name: spec.flavor_name.clone(),
                reason,
            }
        }
        PricingError::UpstreamUnavailable(msg) => PricingError::UpstreamUnavailable(format!(
            "failed to calculate runtime cost for {} ({}): {}",
            spec.instance_type, spec.flavor_name, msg
        )),
        PricingError::Internal(msg) => PricingError::Internal(format!(
            "failed to calculate runtime cost for {} ({}): {}",
            spec.instance_type, spec.flavor_name, msg
        )),
        err @ PricingError::PricingLookupFailed { .. } => err,
    }
}
