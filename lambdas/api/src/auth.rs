use std::str::FromStr;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Set by the API gateway authorizer after it verified the caller.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Chemist,
    Admin,
    Receptionist,
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chemist" => Ok(Self::Chemist),
            "admin" => Ok(Self::Admin),
            "receptionist" => Ok(Self::Receptionist),
            _ => Err(ApiError::Forbidden),
        }
    }
}

/// Roles that may look at bills, take payments and prefill.
pub const FRONT_DESK: &[Role] = &[Role::Chemist, Role::Admin, Role::Receptionist];

/// Roles that may dispense and edit bills.
pub const DISPENSERS: &[Role] = &[Role::Chemist, Role::Admin];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActingUser {
    pub id: String,
    pub role: Role,
}

impl ActingUser {
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let id = header(USER_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        let role = header(USER_ROLE_HEADER).ok_or(ApiError::Forbidden)?.parse()?;

        Ok(Self {
            id: id.to_string(),
            role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}
