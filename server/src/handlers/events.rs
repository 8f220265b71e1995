use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::extractors::{AuthUser, OrganizerUser};
use crate::models::{EventPatch, NewEvent};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct DateFilter {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteOptions {
    #[serde(default)]
    pub cascade: bool,
}

pub(crate) fn event_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

pub async fn list_events(State(state): State<AppState>) -> Response {
    let events = state.events.list().await;
    success(events, "Events retrieved")
}

pub async fn create_event(
    State(state): State<AppState>,
    OrganizerUser(user): OrganizerUser,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Response, AppError> {
    let new_event = body(payload)?;
    let event = state.events.create(new_event, &user).await?;
    Ok(created(event, "Event created"))
}

pub async fn upcoming_events(State(state): State<AppState>) -> Response {
    success(state.events.upcoming().await, "Upcoming events retrieved")
}

pub async fn main_events(State(state): State<AppState>) -> Response {
    success(state.events.main_events().await, "Main events retrieved")
}

/// Whole calendar, or the events of one day with `?date=YYYY-MM-DD`.
pub async fn calendar(
    State(state): State<AppState>,
    filter: Result<Query<DateFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let response = match query(filter)?.date {
        Some(date) => success(state.events.events_on(date).await, "Events for date retrieved"),
        None => success(state.events.calendar().await, "Calendar retrieved"),
    };
    Ok(response)
}

pub async fn get_event(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let event = state.events.get(event_id(path)?).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    OrganizerUser(user): OrganizerUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = event_id(path)?;
    let patch = body(payload)?;
    let event = state.events.update(id, patch, &user).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    OrganizerUser(user): OrganizerUser,
    path: Result<Path<Uuid>, PathRejection>,
    options: Result<Query<DeleteOptions>, QueryRejection>,
) -> Result<Response, AppError> {
    let id = event_id(path)?;
    let cascade = query(options)?.cascade;
    let removed = state.events.delete(id, &user, cascade).await?;
    Ok(success(json!({ "deleted": removed }), "Event deleted"))
}

pub async fn sub_events(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    filter: Result<Query<DateFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let id = event_id(path)?;
    let date = query(filter)?.date;
    let events = state.events.sub_events(id, date).await?;
    Ok(success(events, "Sub-events retrieved"))
}

pub async fn event_dates(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let dates = state.events.event_dates(event_id(path)?).await?;
    Ok(success(dates, "Event dates retrieved"))
}

pub async fn my_events(State(state): State<AppState>, AuthUser(user): AuthUser) -> Response {
    success(state.events.user_events(&user.id).await, "Registered events retrieved")
}
