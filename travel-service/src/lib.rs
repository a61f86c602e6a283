//! # travel-service
//!
//! Back-office REST API for travel packages (products) and the customers and
//! guides (users) who book and run them.
//!
//! The crate is layered bottom-up:
//!
//! - [`repository`]: a generic PostgreSQL repository over any [`Entity`](repository::Entity),
//!   with filter predicates, pagination, soft delete and error classification
//! - [`uow`]: unit of work that scopes repositories to one transaction, with
//!   savepoints for nested work
//! - [`mapper`]: field-by-name copying between models and payloads
//! - [`domain`]: products and users, their payloads, validation and services
//! - [`handlers`]: axum routes answering with the `{status, data, error, pagination}` envelope
//!
//! ## Example
//!
//! ```rust,no_run
//! use travel_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     let _guard = init_tracing(&config)?;
//!
//!     let pool = create_pool(&config.database).await?;
//!     run_migrations(&pool).await?;
//!
//!     let state = AppState::new(config.clone(), pool)?;
//!     Server::new(config).serve(router(state)).await
//! }
//! ```

pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod mapper;
pub mod middleware;
pub mod observability;
pub mod password;
pub mod repository;
pub mod server;
pub mod state;
pub mod uow;
pub mod validation;

/// Commonly used items
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::{create_pool, run_migrations};
    pub use crate::domain::Actor;
    pub use crate::error::{AppError, Error, ErrorCode, Result};
    pub use crate::handlers::{router, ApiResponse};
    pub use crate::observability::init_tracing;
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::uow::UnitOfWork;
}
