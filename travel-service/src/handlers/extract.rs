//! Request extractors that reject with the JSON error envelope
//!
//! axum's own extractors answer malformed input with plain-text bodies.
//! The wrappers here turn every rejection into an [`AppError`] so clients
//! always receive the same response shape.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

use crate::domain::Actor;
use crate::error::AppError;
use crate::validation::Validate;

/// Header carrying the numeric id of the caller
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the display name of the caller
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

/// JSON body that has been decoded and validated
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string decoded into `T`
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Positive numeric `{id}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
        parse_id(&raw).map(Self)
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::bad_request(format!("invalid id: {raw}"))),
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
    }
}

/// Read the caller from the actor headers
///
/// Requests without them are attributed to the system actor.
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let system = Actor::system();

    let id = match header_value(headers, ACTOR_ID_HEADER)? {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AppError::bad_request(format!("invalid {ACTOR_ID_HEADER} header")))?,
        None => system.id,
    };
    let name = match header_value(headers, ACTOR_NAME_HEADER)? {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => system.name,
    };

    Ok(Actor::new(id, name))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| AppError::bad_request(format!("invalid {name} header")))
        })
        .transpose()
}
