//! Business services for the managed resources
//!
//! Each resource module holds its persistent model, request and response
//! payloads, and a service that turns storage results into domain errors.

pub mod actor;
pub mod listing;
pub mod product;
pub mod user;

pub use actor::Actor;
pub use listing::{fetch_page, ListParams, Listing};
