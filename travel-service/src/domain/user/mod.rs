//! Customer and muthawif accounts

mod model;
mod payload;
mod service;

pub use model::{Gender, Role, UnknownVariant, User, UserFilter};
pub use payload::{CreateUserRequest, UpdateUserRequest, UserListQuery, UserResponse};
pub use service::UserService;
