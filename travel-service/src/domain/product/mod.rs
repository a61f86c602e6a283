//! Products sold to pilgrims

mod model;
mod payload;
mod service;

pub use model::{Product, ProductFilter};
pub use payload::{CreateProductRequest, ProductListQuery, ProductResponse, UpdateProductRequest};
pub use service::ProductService;
