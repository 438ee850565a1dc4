//! HTTP handlers for pricing domain

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::catalog::PricingCatalog;
use crate::error::PricingResult;
use crate::models::{
    AddonCost, AddonSpec, CalculateCostCommand, CostEstimation, EstimationPayload, FlavorResponse,
    InstanceResponse, ListInstancesQuery, RuntimeCost, RuntimeSpec, SaveEstimationRequest,
    SaveEstimationResponse,
};
use crate::repository::EstimationRepository;
use crate::service::PricingService;

const TAG: &str = "pricing";

/// OpenAPI documentation for Pricing API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_instances,
        calculate_cost,
        save_estimation,
        get_estimation,
        delete_estimation,
        list_project_estimations,
    ),
    components(
        schemas(
            InstanceResponse,
            FlavorResponse,
            CalculateCostCommand,
            RuntimeSpec,
            AddonSpec,
            CostEstimation,
            RuntimeCost,
            AddonCost,
            EstimationPayload,
            SaveEstimationRequest,
            SaveEstimationResponse,
        )
    ),
    tags(
        (name = TAG, description = "Instance catalog and cost estimation endpoints")
    )
)]
pub struct ApiDoc;

/// Create the pricing router with all HTTP endpoints
pub fn router<C, R>(service: PricingService<C, R>) -> Router
where
    C: PricingCatalog + 'static,
    R: EstimationRepository + 'static,
{
    Router::new()
        .route("/instances", get(list_instances))
        .route("/estimations", post(save_estimation))
        .route("/estimations/calculate", post(calculate_cost))
        .route(
            "/estimations/{id}",
            get(get_estimation).delete(delete_estimation),
        )
        .route(
            "/projects/{project_id}/estimations",
            get(list_project_estimations),
        )
        .with_state(Arc::new(service))
}

/// List instance types and flavors offered in a zone
#[utoipa::path(
    get,
    path = "/instances",
    tag = TAG,
    params(ListInstancesQuery),
    responses(
        (status = 200, description = "Instances with their flavors", body = Vec<InstanceResponse>),
        (status = 502, description = "Pricing source unavailable")
    )
)]
async fn list_instances<C: PricingCatalog, R: EstimationRepository>(
    State(service): State<Arc<PricingService<C, R>>>,
    Query(query): Query<ListInstancesQuery>,
) -> PricingResult<Json<Vec<InstanceResponse>>> {
    let zone_id = query.zone_id.unwrap_or_default();
    let instances = service.list_instances(&zone_id).await?;
    Ok(Json(instances.iter().map(InstanceResponse::from).collect()))
}

/// Calculate a cost estimation without saving it
#[utoipa::path(
    post,
    path = "/estimations/calculate",
    tag = TAG,
    request_body = CalculateCostCommand,
    responses(
        (status = 200, description = "Calculated estimation", body = CostEstimation),
        (status = 422, description = "A runtime could not be priced"),
        (status = 502, description = "Pricing source unavailable")
    )
)]
async fn calculate_cost<C: PricingCatalog, R: EstimationRepository>(
    State(service): State<Arc<PricingService<C, R>>>,
    Json(command): Json<CalculateCostCommand>,
) -> PricingResult<Json<CostEstimation>> {
    let estimation = service.calculate_cost(&command).await?;
    Ok(Json(estimation))
}

/// Save an estimation
#[utoipa::path(
    post,
    path = "/estimations",
    tag = TAG,
    request_body = SaveEstimationRequest,
    responses(
        (status = 201, description = "Estimation saved", body = SaveEstimationResponse),
        (status = 400, description = "Estimation missing or invalid")
    )
)]
async fn save_estimation<C: PricingCatalog, R: EstimationRepository>(
    State(service): State<Arc<PricingService<C, R>>>,
    Json(request): Json<SaveEstimationRequest>,
) -> PricingResult<impl IntoResponse> {
    let estimation = request
        .estimation
        .map(CostEstimation::from_payload)
        .transpose()?;
    let estimation_id = service.save_estimation(estimation.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(SaveEstimationResponse { estimation_id })))
}

/// Get a saved estimation by ID
#[utoipa::path(
    get,
    path = "/estimations/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Estimation ID")
    ),
    responses(
        (status = 200, description = "Estimation found", body = CostEstimation),
        (status = 404, description = "Estimation not found")
    )
)]
async fn get_estimation<C: PricingCatalog, R: EstimationRepository>(
    State(service): State<Arc<PricingService<C, R>>>,
    Path(id): Path<String>,
) -> PricingResult<Json<CostEstimation>> {
    let estimation = service.get_estimation(&id).await?;
    Ok(Json(estimation))
}

/// Delete a saved estimation
#[utoipa::path(
    delete,
    path = "/estimations/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Estimation ID")
    ),
    responses(
        (status = 204, description = "Estimation deleted (or never existed)")
    )
)]
async fn delete_estimation<C: PricingCatalog, R: EstimationRepository>(
    State(service): State<Arc<PricingService<C, R>>>,
    Path(id): Path<String>,
) -> PricingResult<StatusCode> {
    service.delete_estimation(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the saved estimations of a project
#[utoipa::path(
    get,
    path = "/projects/{project_id}/estimations",
    tag = TAG,
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Estimations of the project", body = Vec<CostEstimation>)
    )
)]
async fn list_project_estimations<C: PricingCatalog, R: EstimationRepository>(
    State(service): State<Arc<PricingService<C, R>>>,
    Path(project_id): Path<String>,
) -> PricingResult<Json<Vec<CostEstimation>>> {
    let estimations = service.list_project_estimations(&project_id).await?;
    Ok(Json(estimations))
}
