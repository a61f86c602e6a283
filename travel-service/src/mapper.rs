//! Field-by-name copying between payloads, models and responses
//!
//! Both directions go through serde's data model: the source and the
//! destination are serialized to JSON objects, matching keys are copied, and
//! the destination is deserialized back. Fields the destination does not
//! serialize (e.g. `skip_serializing`) are never written.
//!
//! - [`to_model`] skips source fields that are `null` or an empty string, so a
//!   partial update leaves untouched fields as they were.
//! - [`to_response`] copies every matching field, including nulls.
//!
//! # Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use travel_service::mapper;
//!
//! #[derive(Serialize)]
//! struct Patch { name: Option<String>, note: Option<String> }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Record { name: String, note: String }
//!
//! let mut record = Record { name: "old".into(), note: "kept".into() };
//! mapper::to_model(&Patch { name: Some("new".into()), note: None }, &mut record).unwrap();
//! assert_eq!(record.name, "new");
//! assert_eq!(record.note, "kept");
//! ```

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Mapping failure
#[derive(Debug, Error)]
pub enum MappingError {
    /// Source or destination is not a struct-like value
    #[error("{0} does not serialize to an object")]
    NotAnObject(&'static str),

    /// A copied value does not fit the destination field
    #[error("type mismatch while mapping: {0}")]
    TypeMismatch(#[from] serde_json::Error),
}

/// Copy non-empty fields of `src` into `dst`
pub fn to_model<S, D>(src: &S, dst: &mut D) -> Result<(), MappingError>
where
    S: Serialize + ?Sized,
    D: Serialize + DeserializeOwned,
{
    copy_fields(src, dst, true)
}

/// Copy every matching field of `src` into `dst`
pub fn to_response<S, D>(src: &S, dst: &mut D) -> Result<(), MappingError>
where
    S: Serialize + ?Sized,
    D: Serialize + DeserializeOwned,
{
    copy_fields(src, dst, false)
}

/// Build a fresh `D` from `src` with [`to_response`] semantics
pub fn map<S, D>(src: &S) -> Result<D, MappingError>
where
    S: Serialize + ?Sized,
    D: Serialize + DeserializeOwned + Default,
{
    let mut dst = D::default();
    to_response(src, &mut dst)?;
    Ok(dst)
}

/// Map each element of a slice
pub fn map_all<S, D>(src: &[S]) -> Result<Vec<D>, MappingError>
where
    S: Serialize,
    D: Serialize + DeserializeOwned + Default,
{
    src.iter().map(|item| map(item)).collect()
}

fn copy_fields<S, D>(src: &S, dst: &mut D, ignore_empty: bool) -> Result<(), MappingError>
where
    S: Serialize + ?Sized,
    D: Serialize + DeserializeOwned,
{
    let Value::Object(source) = serde_json::to_value(src)? else {
        return Err(MappingError::NotAnObject("source"));
    };
    let Value::Object(mut target) = serde_json::to_value(&*dst)? else {
        return Err(MappingError::NotAnObject("destination"));
    };

    for (key, value) in source {
        if ignore_empty && is_empty(&value) {
            continue;
        }
        if let Some(slot) = target.get_mut(&key) {
            *slot = value;
        }
    }

    *dst = serde_json::from_value(Value::Object(target))?;
    Ok(())
}

// `false` and `0` count as values: optional payload fields are `Option`s,
// so an explicit zero is a deliberate write.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Model {
        id: i64,
        name: String,
        description: Option<String>,
        is_active: bool,
        price: rust_decimal::Decimal,
    }

    #[derive(Debug, Default, Serialize)]
    struct Patch {
        name: Option<String>,
        description: Option<String>,
        is_active: Option<bool>,
        unknown: Option<String>,
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Response {
        id: i64,
        name: String,
        description: Option<String>,
        is_active: bool,
    }

    fn existing() -> Model {
        Model {
            id: 9,
            name: "Umrah Reguler".to_string(),
            description: Some("12 days".to_string()),
            is_active: true,
            price: "2500.00".parse().unwrap(),
        }
    }

    #[test]
    fn test_to_model_only_touches_set_fields() {
        let mut model = existing();
        let patch = Patch {
            name: Some("Umrah Plus".to_string()),
            ..Patch::default()
        };

        to_model(&patch, &mut model).unwrap();

        assert_eq!(
            model,
            Model {
                name: "Umrah Plus".to_string(),
                ..existing()
            }
        );
    }

    #[test]
    fn test_to_model_skips_empty_strings_but_keeps_false() {
        let mut model = existing();
        let patch = Patch {
            name: Some(String::new()),
            is_active: Some(false),
            ..Patch::default()
        };

        to_model(&patch, &mut model).unwrap();

        assert_eq!(model.name, "Umrah Reguler");
        assert!(!model.is_active);
    }

    #[test]
    fn test_to_response_copies_zero_values() {
        let model = Model {
            description: None,
            is_active: false,
            ..existing()
        };
        let mut response = Response {
            id: 1,
            name: "stale".to_string(),
            description: Some("stale".to_string()),
            is_active: true,
        };

        to_response(&model, &mut response).unwrap();

        assert_eq!(
            response,
            Response {
                id: 9,
                name: "Umrah Reguler".to_string(),
                description: None,
                is_active: false,
            }
        );
    }

    #[test]
    fn test_map_builds_destination() {
        let response: Response = map(&existing()).unwrap();
        assert_eq!(response.id, 9);
        assert_eq!(response.description.as_deref(), Some("12 days"));
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        #[derive(Serialize)]
        struct BadPatch {
            is_active: &'static str,
        }

        let mut model = existing();
        let err = to_model(&BadPatch { is_active: "yes" }, &mut model).unwrap_err();
        assert!(matches!(err, MappingError::TypeMismatch(_)));
        assert_eq!(model, existing());
    }

    #[test]
    fn test_non_struct_source_is_rejected() {
        let mut model = existing();
        let err = to_model(&42, &mut model).unwrap_err();
        assert!(matches!(err, MappingError::NotAnObject("source")));
    }
}
