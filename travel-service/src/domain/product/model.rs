use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{query_builder::Separated, Postgres};
use uuid::Uuid;

use crate::domain::Actor;
use crate::repository::{Entity, Filter, FilterCondition, Predicate};

/// Row of `core.products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub uid: Uuid,
    pub created_on: DateTime<Utc>,
    pub created_by: Value,
    pub modified_on: Option<DateTime<Utc>>,
    pub modified_by: Option<Value>,
    pub deleted_on: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: 0,
            uid: Uuid::nil(),
            created_on: Utc::now(),
            created_by: Actor::system().to_json(),
            modified_on: None,
            modified_by: None,
            deleted_on: None,
            name: String::new(),
            description: None,
            price: Decimal::ZERO,
            is_active: true,
        }
    }
}

impl Entity for Product {
    type Filter = ProductFilter;

    const NAME: &'static str = "product";
    const TABLE: &'static str = "core.products";
    const COLUMNS: &'static [&'static str] = &[
        "uid",
        "created_on",
        "created_by",
        "modified_on",
        "modified_by",
        "name",
        "description",
        "price",
        "is_active",
    ];
    const SORTABLE: &'static [&'static str] = &["name", "price", "is_active", "created_on"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_columns<'qb, 'args: 'qb>(
        &self,
        values: &mut Separated<'qb, 'args, Postgres, &'static str>,
    ) {
        values.push_bind(self.uid);
        values.push_bind(self.created_on);
        values.push_bind(self.created_by.clone());
        values.push_bind(self.modified_on);
        values.push_bind(self.modified_by.clone());
        values.push_bind(self.name.clone());
        values.push_bind(self.description.clone());
        values.push_bind(self.price);
        values.push_bind(self.is_active);
    }
}

/// Listing filter; `search` matches name or description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl Filter for ProductFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(is_active) = self.is_active {
            predicates.push(FilterCondition::eq("is_active", is_active).into());
        }
        if let Some(term) = &self.search {
            predicates.push(Predicate::search(["name", "description"], term.as_str()));
        }
        predicates
    }
}
