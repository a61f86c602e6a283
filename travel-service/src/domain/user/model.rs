use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{query_builder::Separated, Postgres};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Actor;
use crate::repository::{Entity, Filter, FilterCondition, Predicate};

/// A stored value outside the allowed set
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub const CHOICES: &'static [&'static str] = &["male", "female"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(UnknownVariant {
                kind: "gender",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    /// Pilgrimage guide
    Muthawif,
}

impl Role {
    pub const CHOICES: &'static [&'static str] = &["customer", "muthawif"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Muthawif => "muthawif",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "muthawif" => Ok(Self::Muthawif),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of `"user".users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub uid: Uuid,
    pub created_on: DateTime<Utc>,
    pub created_by: Option<Value>,
    pub modified_on: Option<DateTime<Utc>>,
    pub modified_by: Option<Value>,
    pub deleted_on: Option<DateTime<Utc>>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub email: Option<String>,
    pub phone: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            uid: Uuid::nil(),
            created_on: Utc::now(),
            created_by: Some(Actor::system().to_json()),
            modified_on: None,
            modified_by: None,
            deleted_on: None,
            first_name: String::new(),
            middle_name: None,
            last_name: None,
            full_name: String::new(),
            gender: Gender::default(),
            email: None,
            phone: String::new(),
            password_hash: None,
            is_active: true,
            is_verified: false,
            role: Role::default(),
        }
    }
}

impl Entity for User {
    type Filter = UserFilter;

    const NAME: &'static str = "user";
    const TABLE: &'static str = r#""user".users"#;
    const COLUMNS: &'static [&'static str] = &[
        "uid",
        "created_on",
        "created_by",
        "modified_on",
        "modified_by",
        "first_name",
        "middle_name",
        "last_name",
        "full_name",
        "gender",
        "email",
        "phone",
        "password_hash",
        "is_active",
        "is_verified",
        "role",
    ];
    const SORTABLE: &'static [&'static str] = &["full_name", "email", "created_on"];

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
        values.push_bind(self.first_name.clone());
        values.push_bind(self.middle_name.clone());
        values.push_bind(self.last_name.clone());
        values.push_bind(self.full_name.clone());
        values.push_bind(self.gender.as_str());
        values.push_bind(self.email.clone());
        values.push_bind(self.phone.clone());
        values.push_bind(self.password_hash.clone());
        values.push_bind(self.is_active);
        values.push_bind(self.is_verified);
        values.push_bind(self.role.as_str());
    }
}

/// Listing filter; `search` matches full name, email or phone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {
    pub uid: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

impl Filter for UserFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(uid) = self.uid {
            predicates.push(FilterCondition::eq("uid", uid).into());
        }
        if let Some(is_active) = self.is_active {
            predicates.push(FilterCondition::eq("is_active", is_active).into());
        }
        if let Some(is_verified) = self.is_verified {
            predicates.push(FilterCondition::eq("is_verified", is_verified).into());
        }
        if let Some(role) = self.role {
            predicates.push(FilterCondition::eq("role", role.as_str()).into());
        }
        if let Some(term) = &self.search {
            predicates.push(Predicate::search(
                ["full_name", "email", "phone"],
                term.as_str(),
            ));
        }
        predicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::QueryBuilder;

    use crate::repository::{push_predicates, RepositoryOperation};

    #[test]
    fn test_enum_round_trip_through_text() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(Role::try_from("muthawif".to_string()).unwrap(), Role::Muthawif);
        assert_eq!(Role::Muthawif.to_string(), "muthawif");
    }

    #[test]
    fn test_unknown_enum_value() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unknown role 'admin'");
    }

    #[test]
    fn test_choices_match_parsing() {
        for choice in Gender::CHOICES {
            assert_eq!(choice.parse::<Gender>().unwrap().as_str(), *choice);
        }
        for choice in Role::CHOICES {
            assert_eq!(choice.parse::<Role>().unwrap().as_str(), *choice);
        }
    }

    #[test]
    fn test_filter_predicates() {
        let filter = UserFilter {
            is_verified: Some(true),
            role: Some(Role::Customer),
            search: Some("0812".to_string()),
            ..UserFilter::default()
        };

        let mut builder = QueryBuilder::<Postgres>::new("WHERE deleted_on IS NULL");
        push_predicates(&mut builder, &filter.predicates(), RepositoryOperation::Count).unwrap();
        assert_eq!(
            builder.sql(),
            "WHERE deleted_on IS NULL AND is_verified = $1 AND role = $2 \
             AND (full_name ILIKE $3 OR email ILIKE $4 OR phone ILIKE $5)"
        );
    }

    #[test]
    fn test_new_user_flags() {
        let user = User::default();
        assert!(user.is_active);
        assert!(!user.is_verified);
    }

    #[test]
    fn test_columns_match_binds() {
        let mut builder = QueryBuilder::<Postgres>::new("");
        {
            let mut values = builder.separated(", ");
            User::default().bind_columns(&mut values);
        }
        assert_eq!(builder.sql().matches('$').count(), User::COLUMNS.len());
    }
}
