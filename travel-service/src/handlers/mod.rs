//! HTTP handlers and the route table
//!
//! Every endpoint answers with the [`ApiResponse`] envelope. Handlers only
//! extract, delegate to a domain service and wrap the result; decoding and
//! validation failures are turned into [`AppError`](crate::error::AppError)
//! by the extractors in [`extract`].
//!
//! # Routes
//!
//! | Method   | Path                     | Success |
//! |----------|--------------------------|---------|
//! | `POST`   | `/api/v1/products`       | 201     |
//! | `GET`    | `/api/v1/products`       | 200     |
//! | `GET`    | `/api/v1/products/{id}`  | 200     |
//! | `PATCH`  | `/api/v1/products/{id}`  | 200     |
//! | `DELETE` | `/api/v1/products/{id}`  | 200     |
//!
//! The same five routes exist under `/api/v1/users`, plus `GET /health` and
//! `GET /ready` at the root.

pub mod extract;
pub mod products;
pub mod response;
pub mod users;

use axum::{routing::get, Router};

use crate::health::{health, readiness};
use crate::state::AppState;

pub use extract::{EntityId, QueryParams, ValidatedJson, ACTOR_ID_HEADER, ACTOR_NAME_HEADER};
pub use response::{ApiResponse, Created, PaginationMeta, ResponseStatus, DELETED_MESSAGE};

/// Prefix of the versioned API
pub const API_PREFIX: &str = "/api/v1";

/// Build the full route table with state attached
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .nest(API_PREFIX, api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
}
