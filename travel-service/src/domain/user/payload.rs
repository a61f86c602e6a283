use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ListParams;
use crate::error::AppError;
use crate::validation::{FieldErrors, Rule, Validate};

use super::model::{Gender, Role, UserFilter};

const NAME_PART_MAX: usize = 100;
const FULL_NAME_MAX: usize = 255;
const EMAIL_MAX: usize = 320;
const PHONE_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;

/// Body of `POST /users`
///
/// `gender` and `role` stay strings here so an unknown value is reported
/// as a validation failure rather than a decoding error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub role: Option<String>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.check(
            "first_name",
            self.first_name.as_deref(),
            &[Rule::Required, Rule::MaxLength(NAME_PART_MAX)],
        );
        errors.check("middle_name", self.middle_name.as_deref(), &[Rule::MaxLength(NAME_PART_MAX)]);
        errors.check("last_name", self.last_name.as_deref(), &[Rule::MaxLength(NAME_PART_MAX)]);
        errors.check(
            "full_name",
            self.full_name.as_deref(),
            &[Rule::Required, Rule::MaxLength(FULL_NAME_MAX)],
        );
        errors.check(
            "gender",
            self.gender.as_deref(),
            &[Rule::Required, Rule::OneOf(Gender::CHOICES)],
        );
        errors.check(
            "email",
            self.email.as_deref(),
            &[Rule::Required, Rule::Email, Rule::MaxLength(EMAIL_MAX)],
        );
        errors.check(
            "phone",
            self.phone.as_deref(),
            &[Rule::Required, Rule::MaxLength(PHONE_MAX)],
        );
        errors.check(
            "password",
            self.password.as_deref(),
            &[Rule::Required, Rule::MinLength(PASSWORD_MIN)],
        );
        errors.check(
            "role",
            self.role.as_deref(),
            &[Rule::Required, Rule::OneOf(Role::CHOICES)],
        );
        errors.finish()
    }
}

/// Body of `PATCH /users/{id}`
///
/// Email, password and role cannot be changed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.check("first_name", self.first_name.as_deref(), &[Rule::MaxLength(NAME_PART_MAX)]);
        errors.check("middle_name", self.middle_name.as_deref(), &[Rule::MaxLength(NAME_PART_MAX)]);
        errors.check("last_name", self.last_name.as_deref(), &[Rule::MaxLength(NAME_PART_MAX)]);
        errors.check("full_name", self.full_name.as_deref(), &[Rule::MaxLength(FULL_NAME_MAX)]);
        errors.check("gender", self.gender.as_deref(), &[Rule::OneOf(Gender::CHOICES)]);
        errors.check("phone", self.phone.as_deref(), &[Rule::MaxLength(PHONE_MAX)]);
        errors.finish()
    }
}

/// Query string of `GET /users`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub order_by: Option<String>,
    pub order_type: Option<String>,
    pub uid: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

impl UserListQuery {
    pub fn into_parts(self) -> (ListParams, UserFilter) {
        (
            ListParams {
                page: self.page,
                size: self.size,
                order_by: self.order_by,
                order_type: self.order_type,
            },
            UserFilter {
                uid: self.uid,
                is_active: self.is_active,
                is_verified: self.is_verified,
                role: self.role,
                search: self.search,
            },
        )
    }
}

/// A user as returned to clients; the password hash is never included
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub uid: Uuid,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub phone: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub role: Role,
    pub created_on: DateTime<Utc>,
    pub modified_on: Option<DateTime<Utc>>,
}
