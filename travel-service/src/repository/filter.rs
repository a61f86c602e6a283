//! Query predicates built from filter objects
//!
//! Each filter type lists its own predicates through [`Filter`]. Only fields
//! that carry a value produce a predicate, so an empty filter selects every
//! live row.
//!
//! # Example
//!
//! ```rust
//! use travel_service::repository::{Filter, FilterCondition, Predicate};
//!
//! struct ActiveFilter {
//!     is_active: Option<bool>,
//!     search: Option<String>,
//! }
//!
//! impl Filter for ActiveFilter {
//!     fn predicates(&self) -> Vec<Predicate> {
//!         let mut predicates = Vec::new();
//!         if let Some(active) = self.is_active {
//!             predicates.push(FilterCondition::eq("is_active", active).into());
//!         }
//!         if let Some(term) = &self.search {
//!             predicates.push(Predicate::search(["name", "description"], term.as_str()));
//!         }
//!         predicates
//!     }
//! }
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("valid identifier pattern")
});

/// Comparison operator for a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// Case-sensitive pattern match
    Like,
    /// Case-insensitive pattern match
    ILike,
    /// Value is one of a list
    In,
    IsNull,
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::ILike => write!(f, "ILIKE"),
            Self::In => write!(f, "IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Value compared against a column
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    StringList(Vec<String>),
    IntegerList(Vec<i64>),
    Null,
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for FilterValue {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringList(v)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntegerList(v)
    }
}

/// `column <operator> value`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(column, FilterOperator::Equal, value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(column, FilterOperator::NotEqual, value.into())
    }

    pub fn gt(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(column, FilterOperator::GreaterThan, value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(column, FilterOperator::GreaterThanOrEqual, value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(column, FilterOperator::LessThan, value.into())
    }

    pub fn lte(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(column, FilterOperator::LessThanOrEqual, value.into())
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::ILike, FilterValue::String(pattern.into()))
    }

    pub fn in_strings(column: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(column, FilterOperator::In, FilterValue::StringList(values))
    }

    pub fn in_integers(column: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(column, FilterOperator::In, FilterValue::IntegerList(values))
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::IsNull, FilterValue::Null)
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::IsNotNull, FilterValue::Null)
    }
}

/// One AND-ed term of a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A single column comparison
    Compare(FilterCondition),
    /// `(c1 ILIKE '%term%' OR c2 ILIKE '%term%' ...)`
    Search { columns: Vec<String>, term: String },
}

impl Predicate {
    pub fn search<I, S>(columns: I, term: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Search {
            columns: columns.into_iter().map(Into::into).collect(),
            term: term.into(),
        }
    }
}

impl From<FilterCondition> for Predicate {
    fn from(condition: FilterCondition) -> Self {
        Self::Compare(condition)
    }
}

/// A filter object that knows which predicates it contributes
pub trait Filter: Send + Sync {
    /// Predicates for every field that carries a value
    fn predicates(&self) -> Vec<Predicate>;
}

impl Filter for () {
    fn predicates(&self) -> Vec<Predicate> {
        Vec::new()
    }
}

/// Check that a column can be spliced into SQL as an identifier
pub fn validate_identifier(operation: RepositoryOperation, column: &str) -> RepositoryResult<()> {
    if IDENTIFIER.is_match(column) {
        Ok(())
    } else {
        Err(RepositoryError::configuration(
            operation,
            format!("invalid column name '{}'", column),
        ))
    }
}

/// Append ` AND <predicate>` for each predicate
///
/// Values are always bound as parameters. Search terms have their LIKE
/// wildcards escaped so they match literally.
pub fn push_predicates(
    builder: &mut QueryBuilder<'_, Postgres>,
    predicates: &[Predicate],
    operation: RepositoryOperation,
) -> RepositoryResult<()> {
    for predicate in predicates {
        match predicate {
            Predicate::Compare(condition) => {
                validate_identifier(operation, &condition.column)?;
                builder.push(" AND ");
                push_condition(builder, condition);
            }
            Predicate::Search { columns, term } => {
                let term = term.trim();
                if term.is_empty() || columns.is_empty() {
                    continue;
                }
                for column in columns {
                    validate_identifier(operation, column)?;
                }

                let pattern = format!("%{}%", escape_like(term));
                builder.push(" AND (");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder
                        .push(column.as_str())
                        .push(" ILIKE ")
                        .push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
    Ok(())
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &FilterCondition) {
    let column = condition.column.as_str();

    match (&condition.operator, &condition.value) {
        (FilterOperator::IsNull, _) | (FilterOperator::Equal, FilterValue::Null) => {
            builder.push(column).push(" IS NULL");
        }
        (FilterOperator::IsNotNull, _) | (FilterOperator::NotEqual, FilterValue::Null) => {
            builder.push(column).push(" IS NOT NULL");
        }
        (FilterOperator::In, value) => {
            builder.push(column).push(" = ANY(");
            push_value(builder, value);
            builder.push(")");
        }
        (operator, value) => {
            builder.push(column).push(format!(" {} ", operator));
            push_value(builder, value);
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::String(s) => builder.push_bind(s.clone()),
        FilterValue::Integer(n) => builder.push_bind(*n),
        FilterValue::Float(n) => builder.push_bind(*n),
        FilterValue::Boolean(b) => builder.push_bind(*b),
        FilterValue::Uuid(u) => builder.push_bind(*u),
        FilterValue::StringList(v) => builder.push_bind(v.clone()),
        FilterValue::IntegerList(v) => builder.push_bind(v.clone()),
        FilterValue::Null => builder.push("NULL"),
    };
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
