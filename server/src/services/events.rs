use chrono::{Local, NaiveDate};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{CurrentUser, Event, EventPatch, NewEvent};
use crate::registry::{seed, EventRegistry, RegistrationOutcome};
use crate::storage::{SnapshotStore, StoreError};
use crate::utils::error::AppError;
use crate::validation::{validate_new_event, validate_patch};

/// Shared handle to the registry.
///
/// Every call takes the registry lock for its whole duration, so mutations
/// (including the snapshot write that follows them) are serialized.
pub struct EventService {
    registry: Mutex<EventRegistry>,
    store: Arc<dyn SnapshotStore>,
}

impl EventService {
    pub fn new(registry: EventRegistry, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            registry: Mutex::new(registry),
            store,
        }
    }

    /// Loads the saved snapshot, or starts from the demo dataset (or an empty
    /// registry) when nothing has been saved yet.
    pub async fn bootstrap(
        store: Arc<dyn SnapshotStore>,
        seed_demo_data: bool,
    ) -> Result<Self, StoreError> {
        let registry = match store.load_snapshot().await? {
            Some(events) => {
                info!(events = events.len(), "Loaded event snapshot");
                EventRegistry::from_events(events)
            }
            None if seed_demo_data => {
                let registry = seed::demo_registry(Local::now().date_naive());
                store.save_snapshot(registry.events()).await?;
                registry
            }
            None => {
                info!("No event snapshot found, starting empty");
                EventRegistry::new()
            }
        };

        Ok(Self::new(registry, store))
    }

    async fn persist(&self, registry: &EventRegistry) {
        if let Err(e) = self.store.save_snapshot(registry.events()).await {
            error!(error = %e, "Failed to persist event snapshot");
        }
    }

    pub async fn list(&self) -> Vec<Event> {
        let registry = self.registry.lock().await;
        registry.events().to_vec()
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Event, AppError> {
        let registry = self.registry.lock().await;
        registry
            .by_id(event_id)
            .cloned()
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    pub async fn create(
        &self,
        mut new_event: NewEvent,
        organizer: &CurrentUser,
    ) -> Result<Event, AppError> {
        new_event.organizer = organizer.name.clone();
        new_event.organizer_id = organizer.id.clone();

        let mut registry = self.registry.lock().await;
        validate_new_event(&new_event, &registry, Local::now().naive_local())?;

        let event = registry.create(new_event).clone();
        self.persist(&registry).await;

        info!(event_id = %event.id, organizer_id = %organizer.id, "Created event");
        Ok(event)
    }

    pub async fn update(
        &self,
        event_id: Uuid,
        patch: EventPatch,
        organizer: &CurrentUser,
    ) -> Result<Event, AppError> {
        let mut registry = self.registry.lock().await;
        ensure_owner(&registry, event_id, organizer)?;
        validate_patch(event_id, &patch, &registry)?;

        let event = registry
            .update(event_id, patch)
            .cloned()
            .ok_or_else(|| AppError::event_not_found(event_id))?;
        self.persist(&registry).await;

        info!(event_id = %event_id, "Updated event");
        Ok(event)
    }

    /// Deletes an event. A main event that still has sub-events is only
    /// removed together with them, when `cascade` is set. Returns the ids of
    /// every removed event.
    pub async fn delete(
        &self,
        event_id: Uuid,
        organizer: &CurrentUser,
        cascade: bool,
    ) -> Result<Vec<Uuid>, AppError> {
        let mut registry = self.registry.lock().await;
        ensure_owner(&registry, event_id, organizer)?;

        let children: Vec<Uuid> = registry
            .sub_events(event_id)
            .iter()
            .map(|event| event.id)
            .collect();
        if !children.is_empty() && !cascade {
            return Err(AppError::Conflict {
                code: "HAS_SUB_EVENTS",
                message: format!(
                    "Event has {} sub-event(s); delete them first or pass cascade=true",
                    children.len()
                ),
                details: Some(json!({ "subEvents": children })),
            });
        }

        let mut removed = Vec::with_capacity(children.len() + 1);
        for id in children.into_iter().chain(std::iter::once(event_id)) {
            if let Some(event) = registry.delete(id) {
                removed.push(event.id);
            }
        }
        self.persist(&registry).await;

        info!(event_id = %event_id, removed = removed.len(), "Deleted event");
        Ok(removed)
    }

    /// Registers the user. On success the user is also dropped from the
    /// event's waitlist so they never hold both places.
    pub async fn register(&self, event_id: Uuid, user_id: &str) -> Result<Event, AppError> {
        let mut registry = self.registry.lock().await;

        match registry.register(event_id, user_id) {
            RegistrationOutcome::Registered => {
                registry.leave_waitlist(event_id, user_id);
                self.persist(&registry).await;
                info!(event_id = %event_id, user_id = %user_id, "User registered");
                registry
                    .by_id(event_id)
                    .cloned()
                    .ok_or_else(|| AppError::event_not_found(event_id))
            }
            RegistrationOutcome::NotFound => Err(AppError::event_not_found(event_id)),
            RegistrationOutcome::AlreadyRegistered => Err(AppError::conflict(
                "ALREADY_REGISTERED",
                "You are already registered for this event",
            )),
            RegistrationOutcome::Full => Err(AppError::conflict(
                "EVENT_FULL",
                "This event is full; you can join its waitlist instead",
            )),
            RegistrationOutcome::Conflict { .. } => {
                let clashing: Vec<_> = registry
                    .conflicts_for(event_id, user_id)
                    .iter()
                    .map(|event| json!({ "id": event.id, "title": event.title }))
                    .collect();
                Err(AppError::Conflict {
                    code: "SCHEDULE_CONFLICT",
                    message: "This event overlaps with another event you are registered for"
                        .to_string(),
                    details: Some(json!({ "conflictsWith": clashing })),
                })
            }
        }
    }

    pub async fn unregister(&self, event_id: Uuid, user_id: &str) -> Result<Event, AppError> {
        let mut registry = self.registry.lock().await;
        if registry.by_id(event_id).is_none() {
            return Err(AppError::event_not_found(event_id));
        }

        if registry.unregister(event_id, user_id) {
            self.persist(&registry).await;
            info!(event_id = %event_id, user_id = %user_id, "User unregistered");
        }
        registry
            .by_id(event_id)
            .cloned()
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    /// Queues the user for a full event they are not attending.
    pub async fn join_waitlist(&self, event_id: Uuid, user_id: &str) -> Result<Event, AppError> {
        let mut registry = self.registry.lock().await;
        let event = registry
            .by_id(event_id)
            .ok_or_else(|| AppError::event_not_found(event_id))?;

        if event.has_attendee(user_id) {
            return Err(AppError::conflict(
                "ALREADY_REGISTERED",
                "You are already registered for this event",
            ));
        }
        if !event.is_full() {
            return Err(AppError::conflict(
                "EVENT_NOT_FULL",
                "This event still has free places; register instead",
            ));
        }

        if registry.join_waitlist(event_id, user_id) {
            self.persist(&registry).await;
            info!(event_id = %event_id, user_id = %user_id, "User joined waitlist");
        }
        registry
            .by_id(event_id)
            .cloned()
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    pub async fn leave_waitlist(&self, event_id: Uuid, user_id: &str) -> Result<Event, AppError> {
        let mut registry = self.registry.lock().await;
        if registry.by_id(event_id).is_none() {
            return Err(AppError::event_not_found(event_id));
        }

        if registry.leave_waitlist(event_id, user_id) {
            self.persist(&registry).await;
            info!(event_id = %event_id, user_id = %user_id, "User left waitlist");
        }
        registry
            .by_id(event_id)
            .cloned()
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    pub async fn is_in_waitlist(&self, event_id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let registry = self.registry.lock().await;
        if registry.by_id(event_id).is_none() {
            return Err(AppError::event_not_found(event_id));
        }
        Ok(registry.is_in_waitlist(event_id, user_id))
    }

    pub async fn user_events(&self, user_id: &str) -> Vec<Event> {
        let registry = self.registry.lock().await;
        owned(registry.by_user(user_id))
    }

    pub async fn upcoming(&self) -> Vec<Event> {
        let registry = self.registry.lock().await;
        owned(registry.upcoming())
    }

    pub async fn main_events(&self) -> Vec<Event> {
        let registry = self.registry.lock().await;
        owned(registry.main_events())
    }

    /// Sub-events of `parent_id`, optionally only those with a session on
    /// `date`.
    pub async fn sub_events(
        &self,
        parent_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Event>, AppError> {
        let registry = self.registry.lock().await;
        if registry.by_id(parent_id).is_none() {
            return Err(AppError::event_not_found(parent_id));
        }
        Ok(match date {
            Some(date) => owned(registry.sub_events_on(parent_id, date)),
            None => owned(registry.sub_events(parent_id)),
        })
    }

    pub async fn event_dates(&self, event_id: Uuid) -> Result<Vec<NaiveDate>, AppError> {
        let registry = self.registry.lock().await;
        registry
            .event_dates(event_id)
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    pub async fn calendar(&self) -> BTreeMap<NaiveDate, Vec<Event>> {
        let registry = self.registry.lock().await;
        registry
            .calendar()
            .into_iter()
            .map(|(date, events)| (date, owned(events)))
            .collect()
    }

    pub async fn events_on(&self, date: NaiveDate) -> Vec<Event> {
        let registry = self.registry.lock().await;
        owned(registry.events_on(date))
    }
}

fn owned(events: Vec<&Event>) -> Vec<Event> {
    events.into_iter().cloned().collect()
}

fn ensure_owner(
    registry: &EventRegistry,
    event_id: Uuid,
    organizer: &CurrentUser,
) -> Result<(), AppError> {
    let event = registry
        .by_id(event_id)
        .ok_or_else(|| AppError::event_not_found(event_id))?;
    if event.organizer_id != organizer.id {
        return Err(AppError::Forbidden(
            "Only the event's organizer can change it".to_string(),
        ));
    }
    Ok(())
}
