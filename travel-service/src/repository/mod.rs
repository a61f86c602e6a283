//! Generic data access over PostgreSQL
//!
//! - [`PgRepository`] implements find-all, count, find-by-id, save, update and
//!   soft delete for any [`Entity`].
//! - [`Filter`] turns a typed filter object into [`Predicate`]s; only fields
//!   that carry a value restrict the query.
//! - [`Connection`] decides whether statements run on the pool or inside a
//!   shared [`TransactionContext`].
//! - [`RepositoryError`] classifies driver failures once, including parsed
//!   unique-constraint violations.
//!
//! # Example
//!
//! ```rust,ignore
//! use travel_service::repository::{PageRequest, PgRepository, RepositoryErrorKind};
//!
//! let repo = PgRepository::<Product>::new(pool.clone());
//! let rows = repo.find_all(None, PageRequest::from_parts(Some(1), Some(20)), None).await?;
//!
//! match repo.save(&product).await {
//!     Err(e) if e.kind == RepositoryErrorKind::UniqueViolation => {
//!         println!("{:?} already taken", e.constraint());
//!     }
//!     other => { other?; }
//! }
//! ```

mod connection;
mod constraint;
mod error;
mod filter;
mod pagination;
mod postgres;

pub use connection::{Connection, Handle, Savepoint, TransactionContext};
pub use constraint::UniqueViolation;
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult};
pub use filter::{
    push_predicates, validate_identifier, Filter, FilterCondition, FilterOperator, FilterValue,
    Predicate,
};
pub use pagination::{offset, OrderDirection, PageRequest, Sort};
pub use postgres::{Entity, PgRepository};
