//! Current-user extraction.
//!
//! Identity comes from the front end's session mock and is passed through
//! plain headers. Nothing here is a security boundary; it only tells the
//! handlers who is acting and in which role.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::models::{CurrentUser, Role};
use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header_value(parts: &Parts, name: &str) -> Result<Option<String>, AppError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::AuthError(format!("Header '{}' is not valid text", name)))?
                .trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
    }
}

pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, USER_ID_HEADER)?
            .ok_or_else(|| AppError::AuthError("You need to sign in first".to_string()))?;

        let role = match header_value(parts, USER_ROLE_HEADER)? {
            Some(raw) => raw.parse::<Role>().map_err(AppError::AuthError)?,
            None => Role::Student,
        };

        let name = header_value(parts, USER_NAME_HEADER)?.unwrap_or_else(|| id.clone());

        Ok(AuthUser(CurrentUser { id, name, role }))
    }
}

/// A signed-in user acting as an organizer.
pub struct OrganizerUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for OrganizerUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_organizer() {
            return Err(AppError::Forbidden(
                "Only organizers can manage events".to_string(),
            ));
        }
        Ok(OrganizerUser(user))
    }
}
