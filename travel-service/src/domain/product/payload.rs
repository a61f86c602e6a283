use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ListParams;
use crate::error::AppError;
use crate::validation::{FieldErrors, Rule, Validate};

use super::model::ProductFilter;

const NAME_MAX: usize = 255;

/// Rules for a price, matching the `NUMERIC(18,2) CHECK (price > 0)` column
pub(crate) const PRICE_RULES: &[Rule] = &[
    Rule::Numeric {
        precision: 18,
        scale: 2,
    },
    Rule::PositiveDecimal,
];

/// Body of `POST /products`
///
/// `price` is a decimal string and is parsed by the service, so it is left
/// out when the payload is copied onto a model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub price: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.check("name", self.name.as_deref(), &[Rule::Required, Rule::MaxLength(NAME_MAX)]);
        errors.check("price", self.price.as_deref(), &[Rule::Required]);
        errors.check("price", self.price.as_deref(), PRICE_RULES);
        errors.finish()
    }
}

/// Body of `PATCH /products/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub price: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.check("name", self.name.as_deref(), &[Rule::MaxLength(NAME_MAX)]);
        errors.check("price", self.price.as_deref(), PRICE_RULES);
        errors.finish()
    }
}

/// Query string of `GET /products`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub order_by: Option<String>,
    pub order_type: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl ProductListQuery {
    pub fn into_parts(self) -> (ListParams, ProductFilter) {
        (
            ListParams {
                page: self.page,
                size: self.size,
                order_by: self.order_by,
                order_type: self.order_type,
            },
            ProductFilter {
                is_active: self.is_active,
                search: self.search,
            },
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i64,
    pub uid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_on: DateTime<Utc>,
    pub modified_on: Option<DateTime<Utc>>,
}
