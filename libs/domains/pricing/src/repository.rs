use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{PricingError, PricingResult};
use crate::models::CostEstimation;

/// Repository trait for cost estimation persistence.
///
/// Every estimation crossing this boundary is an independent copy: callers
/// hand in a reference that is copied on save, and get owned copies back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EstimationRepository: Send + Sync {
    /// Store an estimation under its own id, replacing any previous version
    async fn save(&self, estimation: &CostEstimation) -> PricingResult<String>;

    /// Get an estimation by ID
    async fn find_by_id(&self, id: &str) -> PricingResult<Option<CostEstimation>>;

    /// Get all estimations of a project, in no particular order
    async fn find_by_project_id(&self, project_id: &str) -> PricingResult<Vec<CostEstimation>>;

    /// Delete an estimation by ID; deleting an unknown ID is not an error
    async fn delete(&self, id: &str) -> PricingResult<()>;
}

/// In-memory implementation of EstimationRepository (process lifetime only)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEstimationRepository {
    estimations: Arc<RwLock<HashMap<String, CostEstimation>>>,
}

impl InMemoryEstimationRepository {
    pub fn new() -> Self {
        Self {
            estimations: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl EstimationRepository for InMemoryEstimationRepository {
    async fn save(&self, estimation: &CostEstimation) -> PricingResult<String> {
        if estimation.id().is_empty() {
            return Err(PricingError::InvalidArgument(
                "estimation id is required".to_string(),
            ));
        }

        let copy = estimation.clone();
        let id = copy.id().to_string();

        let mut estimations = self.estimations.write().await;
        estimations.insert(id.clone(), copy);

        tracing::info!(estimation_id = %id, project_id = %estimation.project_id(), "Saved estimation");
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> PricingResult<Option<CostEstimation>> {
        let estimations = self.estimations.read().await;
        Ok(estimations.get(id).cloned())
    }

    async fn find_by_project_id(&self, project_id: &str) -> PricingResult<Vec<CostEstimation>> {
        let estimations = self.estimations.read().await;

        let result = estimations
            .values()
            .filter(|e| e.project_id() == project_id)
            .cloned()
            .collect();

        Ok(result)
    }

    async fn delete(&self, id: &str) -> PricingResult<()> {
        let mut estimations = self.estimations.write().await;

        if estimations.remove(id).is_some() {
            tracing::info!(estimation_id = %id, "Deleted estimation");
        }

        Ok(())
    }
}
