//! `/products` endpoints

use axum::extract::State;

use crate::domain::product::{
    CreateProductRequest, ProductListQuery, ProductResponse, UpdateProductRequest,
};
use crate::domain::Actor;
use crate::error::AppError;
use crate::state::AppState;

use super::extract::{EntityId, QueryParams, ValidatedJson};
use super::response::{ApiResponse, Created, DELETED_MESSAGE};

pub async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<Created<ProductResponse>, AppError> {
    let product = state.products().create(&actor, request).await?;
    Ok(Created(product))
}

pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductListQuery>,
) -> Result<ApiResponse<Vec<ProductResponse>>, AppError> {
    let (params, filter) = query.into_parts();
    let listing = state.products().list(&params, &filter).await?;
    Ok(ApiResponse::paginated(listing.items, listing.pagination))
}

pub async fn get_product(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<ApiResponse<ProductResponse>, AppError> {
    let product = state.products().get(id).await?;
    Ok(ApiResponse::success(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    actor: Actor,
    EntityId(id): EntityId,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> Result<ApiResponse<ProductResponse>, AppError> {
    let product = state.products().update(&actor, id, request).await?;
    Ok(ApiResponse::success(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<ApiResponse<&'static str>, AppError> {
    state.products().delete(id).await?;
    Ok(ApiResponse::success(DELETED_MESSAGE))
}
