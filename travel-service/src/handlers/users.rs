//! `/users` endpoints

use axum::extract::State;

use crate::domain::user::{CreateUserRequest, UpdateUserRequest, UserListQuery, UserResponse};
use crate::domain::Actor;
use crate::error::AppError;
use crate::state::AppState;

use super::extract::{EntityId, QueryParams, ValidatedJson};
use super::response::{ApiResponse, Created, DELETED_MESSAGE};

pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<Created<UserResponse>, AppError> {
    let user = state.users().create(&actor, request).await?;
    Ok(Created(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UserListQuery>,
) -> Result<ApiResponse<Vec<UserResponse>>, AppError> {
    let (params, filter) = query.into_parts();
    let listing = state.users().list(&params, &filter).await?;
    Ok(ApiResponse::paginated(listing.items, listing.pagination))
}

pub async fn get_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = state.users().get(id).await?;
    Ok(ApiResponse::success(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    EntityId(id): EntityId,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = state.users().update(&actor, id, request).await?;
    Ok(ApiResponse::success(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<ApiResponse<&'static str>, AppError> {
    state.users().delete(id).await?;
    Ok(ApiResponse::success(DELETED_MESSAGE))
}
