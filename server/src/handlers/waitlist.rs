use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use super::events::event_id;
use crate::extractors::AuthUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WaitlistStatus {
    in_waitlist: bool,
}

pub async fn join(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let event = state.events.join_waitlist(event_id(path)?, &user.id).await?;
    Ok(success(event, "Joined the waitlist"))
}

pub async fn leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let event = state.events.leave_waitlist(event_id(path)?, &user.id).await?;
    Ok(success(event, "Left the waitlist"))
}

pub async fn status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let in_waitlist = state
        .events
        .is_in_waitlist(event_id(path)?, &user.id)
        .await?;
    Ok(success(WaitlistStatus { in_waitlist }, "Waitlist status retrieved"))
}
