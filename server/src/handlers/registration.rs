use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use super::events::event_id;
use crate::extractors::AuthUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn register(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let event = state.events.register(event_id(path)?, &user.id).await?;
    Ok(success(event, "Registration confirmed"))
}

pub async fn unregister(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let event = state.events.unregister(event_id(path)?, &user.id).await?;
    Ok(success(event, "Registration cancelled"))
}
