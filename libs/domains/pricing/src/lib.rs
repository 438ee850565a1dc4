//! Pricing Domain
//!
//! Hosting cost estimation: instance catalogs, cost calculation and
//! saved estimations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (axum + utoipa)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Orchestration, input validation
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼────┐ ┌▼───────────┐
//! │Catalog│ │ Repository │  ← Pricing source / estimation storage
//! └──┬────┘ └┬───────────┘
//!    │       │
//! ┌──▼───────▼──┐
//! │   Models    │  ← Entities, DTOs, cost arithmetic
//! └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_pricing::{
//!     handlers, CleverCloudCatalog, InMemoryEstimationRepository, PricingService, DEFAULT_TIMEOUT,
//! };
//!
//! let catalog = CleverCloudCatalog::new(CleverCloudCatalog::DEFAULT_API_URL, DEFAULT_TIMEOUT)?;
//! let service = PricingService::new(catalog, InMemoryEstimationRepository::new());
//! let router = handlers::router(service);
//! ```

pub mod calculator;
pub mod catalog;
pub mod clever_cloud;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use calculator::CostCalculator;
pub use catalog::{PricingCatalog, StaticCatalog};
pub use clever_cloud::{CleverCloudCatalog, DEFAULT_TIMEOUT};
pub use error::{PricingError, PricingResult};
pub use models::{
    AddonCost, AddonSpec, CalculateCostCommand, CostEstimation, EstimationPayload, Flavor,
    Instance, RuntimeCost, RuntimeSpec, DEFAULT_ZONE, HOURS_PER_MONTH, RESERVED_ESTIMATION_ID,
};
pub use repository::{EstimationRepository, InMemoryEstimationRepository};
pub use service::PricingService;
