use std::sync::Arc;

use crate::calculator::CostCalculator;
use crate::catalog::PricingCatalog;
use crate::error::{PricingError, PricingResult};
use crate::models::{CalculateCostCommand, CostEstimation, Instance, DEFAULT_ZONE};
use crate::repository::EstimationRepository;

/// Service orchestrating catalog queries, cost calculation and estimation storage
pub struct PricingService<C: PricingCatalog, R: EstimationRepository> {
    catalog: Arc<C>,
    repository: Arc<R>,
    calculator: CostCalculator<C>,
    default_zone: String,
}

impl<C: PricingCatalog, R: EstimationRepository> Clone for PricingService<C, R> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            repository: Arc::clone(&self.repository),
            calculator: self.calculator.clone(),
            default_zone: self.default_zone.clone(),
        }
    }
}

impl<C: PricingCatalog, R: EstimationRepository> PricingService<C, R> {
    /// Create a new pricing service
    pub fn new(catalog: C, repository: R) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            calculator: CostCalculator::new(Arc::clone(&catalog)),
            catalog,
            repository: Arc::new(repository),
            default_zone: DEFAULT_ZONE.to_string(),
        }
    }

    /// Zone used when a caller lists instances without one
    pub fn with_default_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.default_zone = zone_id.into();
        self
    }

    /// List the instances of a zone (default zone when empty)
    pub async fn list_instances(&self, zone_id: &str) -> PricingResult<Vec<Instance>> {
        let zone_id = if zone_id.is_empty() {
            self.default_zone.as_str()
        } else {
            zone_id
        };

        self.catalog.list_instances(zone_id).await
    }

    /// Get an estimation by ID
    pub async fn get_estimation(&self, estimation_id: &str) -> PricingResult<CostEstimation> {
        if estimation_id.is_empty() {
            return Err(PricingError::InvalidArgument(
                "estimation ID is required".to_string(),
            ));
        }

        self.repository
            .find_by_id(estimation_id)
            .await?
            .ok_or_else(|| PricingError::NotFound(format!("estimation {} not found", estimation_id)))
    }

    /// Calculate a new (unsaved) estimation
    pub async fn calculate_cost(&self, command: &CalculateCostCommand) -> PricingResult<CostEstimation> {
        self.calculator.calculate(command).await
    }

    /// Save an estimation and return its ID
    pub async fn save_estimation(&self, estimation: Option<&CostEstimation>) -> PricingResult<String> {
        let estimation = estimation
            .ok_or_else(|| PricingError::InvalidArgument("estimation is required".to_string()))?;

        self.repository.save(estimation).await
    }

    /// List the saved estimations of a project
    pub async fn list_project_estimations(&self, project_id: &str) -> PricingResult<Vec<CostEstimation>> {
        if project_id.is_empty() {
            return Err(PricingError::InvalidArgument(
                "project ID is required".to_string(),
            ));
        }

        self.repository.find_by_project_id(project_id).await
    }

    /// Delete an estimation; unknown IDs are ignored
    pub async fn delete_estimation(&self, estimation_id: &str) -> PricingResult<()> {
        if estimation_id.is_empty() {
            return Err(PricingError::InvalidArgument(
                "estimation ID is required".to_string(),
            ));
        }

        self.repository.delete(estimation_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockPricingCatalog;
    use crate::models::{AddonSpec, RuntimeSpec};
    use crate::repository::{InMemoryEstimationRepository, MockEstimationRepository};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_list_instances_defaults_to_paris() {
        let mut catalog = MockPricingCatalog::new();
        catalog
            .expect_list_instances()
            .with(eq("par"))
            .times(1)
            .returning(|_| Ok(vec![Instance::new("node", "Node.js", "20")]));

        let service = PricingService::new(catalog, MockEstimationRepository::new());
        let instances = service.list_instances("").await.unwrap();

        assert_eq!(instances.len(), 1);
    }

    #[tokio::test]
    async fn test_list_instances_uses_requested_zone() {
        let mut catalog = MockPricingCatalog::new();
        catalog
            .expect_list_instances()
            .with(eq("mtl"))
            .times(1)
            .returning(|_| Ok(vec![]));

        let service = PricingService::new(catalog, MockEstimationRepository::new());
        let instances = service.list_instances("mtl").await.unwrap();

        assert!(instances.is_empty(), "an empty catalog is not an error");
    }

    #[tokio::test]
    async fn test_list_instances_propagates_upstream_errors() {
        let mut catalog = MockPricingCatalog::new();
        catalog
            .expect_list_instances()
            .returning(|_| Err(PricingError::UpstreamUnavailable("unexpected status code: 500".into())));

        let service = PricingService::new(catalog, MockEstimationRepository::new());
        let result = service.list_instances("par").await;

        assert!(matches!(result, Err(PricingError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_get_estimation_requires_id() {
        let service = PricingService::new(MockPricingCatalog::new(), MockEstimationRepository::new());

        let result = service.get_estimation("").await;
        assert!(matches!(result, Err(PricingError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_get_estimation_maps_absence_to_not_found() {
        let mut repo = MockEstimationRepository::new();
        repo.expect_find_by_id()
            .with(eq("missing"))
            .times(1)
            .returning(|_| Ok(None));

        let service = PricingService::new(MockPricingCatalog::new(), repo);
        let result = service.get_estimation("missing").await;

        assert!(matches!(result, Err(PricingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_estimation_requires_estimation() {
        let mut repo = MockEstimationRepository::new();
        repo.expect_save().never();

        let service = PricingService::new(MockPricingCatalog::new(), repo);
        let result = service.save_estimation(None).await;

        assert!(matches!(result, Err(PricingError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_list_and_delete_require_ids() {
        let service = PricingService::new(MockPricingCatalog::new(), MockEstimationRepository::new());

        assert!(matches!(
            service.list_project_estimations("").await,
            Err(PricingError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.delete_estimation("").await,
            Err(PricingError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_calculate_save_get_delete_flow() {
        let mut catalog = MockPricingCatalog::new();
        catalog.expect_get_flavor_price().returning(|_, _| Ok(0.02));

        let service = PricingService::new(catalog, InMemoryEstimationRepository::new());
        let command = CalculateCostCommand {
            project_id: "project-1".to_string(),
            runtime_specs: vec![RuntimeSpec {
                instance_type: "XS".to_string(),
                flavor_name: "pico".to_string(),
                min_instances: 1,
                max_instances: 3,
            }],
            addon_specs: vec![AddonSpec {
                provider_id: "redis".to_string(),
                plan_id: "s".to_string(),
            }],
        };

        let estimation = service.calculate_cost(&command).await.unwrap();
        let id = service.save_estimation(Some(&estimation)).await.unwrap();
        assert_eq!(id, estimation.id());

        let fetched = service.get_estimation(&id).await.unwrap();
        assert_eq!(fetched, estimation);

        let listed = service.list_project_estimations("project-1").await.unwrap();
        assert_eq!(listed.len(), 1);

        service.delete_estimation(&id).await.unwrap();
        assert!(matches!(
            service.get_estimation(&id).await,
            Err(PricingError::NotFound(_))
        ));
        service.delete_estimation(&id).await.unwrap();
    }
}
