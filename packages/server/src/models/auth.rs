use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Roles a user may hold.
pub const ROLES: &[&str] = &["viewer", "editor", "admin"];

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Amina Benali")]
    pub name: String,
    #[schema(example = "amina@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// One of `viewer`, `editor`, `admin`.
    #[schema(example = "editor")]
    pub role: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
        || payload.role.trim().is_empty()
    {
        return Err(AppError::Validation(
            "All fields (name, email, password, role) are required".into(),
        ));
    }
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    validate_role(&payload.role)
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "amina@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password".into(),
        ));
    }
    Ok(())
}

/// Partial user update. Absent or blank fields are left untouched.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// New password; stored re-hashed.
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    /// Drop blank values so only real changes remain.
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            name: keep(self.name).map(|s| s.trim().to_string()),
            email: keep(self.email).map(|s| s.trim().to_string()),
            password: self.password.filter(|s| !s.is_empty()),
            role: keep(self.role).map(|s| s.trim().to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

pub fn validate_update_user_request(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    if let Some(ref role) = payload.role {
        validate_role(role)?;
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().chars().count() > 255 {
        return Err(AppError::Validation(
            "Name must be at most 255 characters".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.len() <= 255
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

fn validate_role(role: &str) -> Result<(), AppError> {
    if !ROLES.contains(&role.trim()) {
        return Err(AppError::Validation("Invalid role value".into()));
    }
    Ok(())
}

/// A user without credentials.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Amina Benali")]
    pub name: String,
    #[schema(example = "amina@example.com")]
    pub email: String,
    #[schema(example = "editor")]
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token valid for 7 days.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// The caller's identity as carried in the token.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "amina@example.com")]
    pub email: String,
    #[schema(example = "editor")]
    pub role: String,
}
