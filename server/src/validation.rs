//! Input checks performed before handing data to the registry.
//!
//! The registry stores whatever it is given, so every request that creates or
//! edits an event goes through here first.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::models::{EventPatch, NewEvent, ScheduleEntry};
use crate::registry::EventRegistry;
use crate::utils::error::AppError;

fn invalid(message: impl Into<String>) -> AppError {
    AppError::ValidationError(message.into())
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

fn validate_schedule(schedule: &[ScheduleEntry]) -> Result<(), AppError> {
    if schedule.is_empty() {
        return Err(invalid("An event needs at least one session"));
    }
    for (index, session) in schedule.iter().enumerate() {
        if !session.is_well_formed() {
            return Err(invalid(format!(
                "Session {} on {} must end after it starts",
                index + 1,
                session.date
            )));
        }
    }
    Ok(())
}

fn validate_capacity(max_attendees: Option<u32>) -> Result<(), AppError> {
    if max_attendees == Some(0) {
        return Err(invalid("'maxAttendees' must be greater than zero"));
    }
    Ok(())
}

fn validate_parent(registry: &EventRegistry, parent_id: Uuid) -> Result<(), AppError> {
    match registry.by_id(parent_id) {
        Some(parent) if parent.is_main() => Ok(()),
        Some(_) => Err(invalid(
            "Sub-events can only belong to a main event, not to another sub-event",
        )),
        None => Err(invalid(format!("Parent event '{}' does not exist", parent_id))),
    }
}

/// Checks a creation request. At least one session must start after `now`.
pub fn validate_new_event(
    new_event: &NewEvent,
    registry: &EventRegistry,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    require_text("title", &new_event.title)?;
    require_text("description", &new_event.description)?;
    validate_schedule(&new_event.schedule)?;
    validate_capacity(new_event.max_attendees)?;

    if !new_event
        .schedule
        .iter()
        .any(|session| session.starts_at() > now)
    {
        return Err(invalid("The event must be scheduled in the future"));
    }

    if let Some(parent_id) = new_event.parent_id {
        validate_parent(registry, parent_id)?;
    }

    Ok(())
}

/// Checks an update against the event's current state.
pub fn validate_patch(
    event_id: Uuid,
    patch: &EventPatch,
    registry: &EventRegistry,
) -> Result<(), AppError> {
    let event = registry
        .by_id(event_id)
        .ok_or_else(|| AppError::event_not_found(event_id))?;

    if patch.is_empty() {
        return Err(invalid("The update does not change any field"));
    }
    if let Some(title) = &patch.title {
        require_text("title", title)?;
    }
    if let Some(description) = &patch.description {
        require_text("description", description)?;
    }
    if let Some(organizer_id) = &patch.organizer_id {
        require_text("organizerId", organizer_id)?;
    }
    if let Some(schedule) = &patch.schedule {
        validate_schedule(schedule)?;
    }

    if let Some(max_attendees) = patch.max_attendees {
        validate_capacity(max_attendees)?;
        if let Some(max) = max_attendees {
            if (max as usize) < event.attendees.len() {
                return Err(invalid(format!(
                    "'maxAttendees' cannot be lower than the {} current attendees",
                    event.attendees.len()
                )));
            }
        }
    }

    if let Some(Some(parent_id)) = patch.parent_id {
        if parent_id == event_id {
            return Err(invalid("An event cannot be its own parent"));
        }
        validate_parent(registry, parent_id)?;
        if !registry.sub_events(event_id).is_empty() {
            return Err(invalid(
                "An event with sub-events cannot itself become a sub-event",
            ));
        }
    }

    Ok(())
}
