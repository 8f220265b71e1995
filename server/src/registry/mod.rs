//! In-memory event registry.
//!
//! Owns the ordered event collection and enforces the registration rules:
//! capacity, duplicate registration and schedule conflicts against the
//! user's current registrations. Everything here is synchronous; callers that
//! share a registry across tasks must serialize access (see
//! [`crate::services::EventService`]).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{Event, EventPatch, NewEvent};

pub mod seed;

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    AlreadyRegistered,
    Full,
    /// The user already attends `event_id`, which has a session overlapping
    /// the requested event.
    Conflict { event_id: Uuid },
    NotFound,
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    events: Vec<Event>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Stores a new event with a fresh id and empty attendee and waitlist
    /// sets. The input is stored as given; validation belongs to the caller.
    pub fn create(&mut self, new_event: NewEvent) -> &Event {
        self.create_at(new_event, Utc::now())
    }

    pub fn create_at(&mut self, new_event: NewEvent, created_at: DateTime<Utc>) -> &Event {
        let event = Event::from_new(Uuid::new_v4(), created_at, new_event);
        let index = self.events.len();
        self.events.push(event);
        &self.events[index]
    }

    /// Applies every field present in `patch`. Returns `None` when no event
    /// has that id.
    pub fn update(&mut self, event_id: Uuid, patch: EventPatch) -> Option<&Event> {
        let event = self.find_mut(event_id)?;
        event.apply(patch);
        Some(&*event)
    }

    /// Removes the event. Sub-events are left in place with a dangling
    /// `parent_id`.
    pub fn delete(&mut self, event_id: Uuid) -> Option<Event> {
        let index = self.position(event_id)?;
        Some(self.events.remove(index))
    }

    pub fn register(&mut self, event_id: Uuid, user_id: &str) -> RegistrationOutcome {
        let Some(index) = self.position(event_id) else {
            return RegistrationOutcome::NotFound;
        };

        let candidate = &self.events[index];
        if candidate.has_attendee(user_id) {
            return RegistrationOutcome::AlreadyRegistered;
        }
        if candidate.is_full() {
            return RegistrationOutcome::Full;
        }
        if let Some(existing) = self.registrations_overlapping(candidate, user_id).first() {
            return RegistrationOutcome::Conflict {
                event_id: existing.id,
            };
        }

        self.events[index].attendees.push(user_id.to_string());
        RegistrationOutcome::Registered
    }

    /// Removes the user from the attendees. Nobody is promoted from the
    /// waitlist. Returns whether anything changed.
    pub fn unregister(&mut self, event_id: Uuid, user_id: &str) -> bool {
        let Some(event) = self.find_mut(event_id) else {
            return false;
        };
        let before = event.attendees.len();
        event.attendees.retain(|id| id != user_id);
        event.attendees.len() != before
    }

    /// Appends the user to the waitlist unless already queued. Neither the
    /// event's fullness nor the user's attendance is checked here.
    pub fn join_waitlist(&mut self, event_id: Uuid, user_id: &str) -> bool {
        match self.find_mut(event_id) {
            Some(event) if !event.is_waitlisted(user_id) => {
                event.waitlist.push(user_id.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn leave_waitlist(&mut self, event_id: Uuid, user_id: &str) -> bool {
        let Some(event) = self.find_mut(event_id) else {
            return false;
        };
        let before = event.waitlist.len();
        event.waitlist.retain(|id| id != user_id);
        event.waitlist.len() != before
    }

    pub fn is_in_waitlist(&self, event_id: Uuid, user_id: &str) -> bool {
        self.by_id(event_id)
            .map(|event| event.is_waitlisted(user_id))
            .unwrap_or(false)
    }

    pub fn by_id(&self, event_id: Uuid) -> Option<&Event> {
        self.events.iter().find(|event| event.id == event_id)
    }

    pub fn by_user(&self, user_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| event.has_attendee(user_id))
            .collect()
    }

    pub fn main_events(&self) -> Vec<&Event> {
        self.events.iter().filter(|event| event.is_main()).collect()
    }

    pub fn sub_events(&self, parent_id: Uuid) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| event.parent_id == Some(parent_id))
            .collect()
    }

    pub fn is_main_event(&self, event_id: Uuid) -> bool {
        self.by_id(event_id).map(Event::is_main).unwrap_or(false)
    }

    /// Sub-events whose parent is missing or is itself a sub-event.
    pub fn orphaned_sub_events(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| match event.parent_id {
                Some(parent_id) => !self.is_main_event(parent_id),
                None => false,
            })
            .collect()
    }

    pub fn upcoming(&self) -> Vec<&Event> {
        self.upcoming_at(Local::now().naive_local())
    }

    /// Events with a session starting after `now`, ordered by their earliest
    /// such session. Ties keep collection order.
    pub fn upcoming_at(&self, now: NaiveDateTime) -> Vec<&Event> {
        let mut upcoming: Vec<(NaiveDateTime, &Event)> = self
            .events
            .iter()
            .filter_map(|event| event.next_start_after(now).map(|start| (start, event)))
            .collect();
        upcoming.sort_by_key(|(start, _)| *start);
        upcoming.into_iter().map(|(_, event)| event).collect()
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| event.has_session_on(date))
            .collect()
    }

    /// Every date that has at least one session, with the events running on
    /// it. Each event is listed once per date.
    pub fn calendar(&self) -> BTreeMap<NaiveDate, Vec<&Event>> {
        let mut calendar: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
        for event in &self.events {
            for session in &event.schedule {
                let day = calendar.entry(session.date).or_default();
                if !day.iter().any(|listed| listed.id == event.id) {
                    day.push(event);
                }
            }
        }
        calendar
    }

    /// Distinct session dates of an event, in schedule order.
    pub fn event_dates(&self, event_id: Uuid) -> Option<Vec<NaiveDate>> {
        let event = self.by_id(event_id)?;
        let mut dates = Vec::new();
        for session in &event.schedule {
            if !dates.contains(&session.date) {
                dates.push(session.date);
            }
        }
        Some(dates)
    }

    pub fn sub_events_on(&self, parent_id: Uuid, date: NaiveDate) -> Vec<&Event> {
        self.sub_events(parent_id)
            .into_iter()
            .filter(|event| event.has_session_on(date))
            .collect()
    }

    /// Events the user attends whose sessions clash with `event_id`.
    pub fn conflicts_for(&self, event_id: Uuid, user_id: &str) -> Vec<&Event> {
        match self.by_id(event_id) {
            Some(candidate) => self.registrations_overlapping(candidate, user_id),
            None => Vec::new(),
        }
    }

    fn registrations_overlapping(&self, candidate: &Event, user_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|existing| {
                existing.id != candidate.id
                    && existing.has_attendee(user_id)
                    && candidate.overlaps_with(existing)
            })
            .collect()
    }

    fn position(&self, event_id: Uuid) -> Option<usize> {
        self.events.iter().position(|event| event.id == event_id)
    }

    fn find_mut(&mut self, event_id: Uuid) -> Option<&mut Event> {
        self.events.iter_mut().find(|event| event.id == event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleEntry;
    use chrono::NaiveTime;

    fn session(date: &str, start: &str, end: &str) -> ScheduleEntry {
        ScheduleEntry::new(
            date.parse().unwrap(),
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        )
    }

    fn draft(title: &str, schedule: Vec<ScheduleEntry>) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: format!("{} description", title),
            schedule,
            organizer: "Coordination".to_string(),
            organizer_id: "organizer-1".to_string(),
            max_attendees: None,
            location: None,
            category: None,
            image_url: None,
            parent_id: None,
        }
    }

    fn add(registry: &mut EventRegistry, new_event: NewEvent) -> Uuid {
        registry.create(new_event).id
    }

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_create_assigns_identity_and_empty_sets() {
        let mut registry = EventRegistry::new();
        let event = registry.create(draft("Talk", vec![session("2030-01-01", "10:00", "11:00")]));
        assert!(event.attendees.is_empty());
        assert!(event.waitlist.is_empty());
        let id = event.id;

        let other = add(&mut registry, draft("Other", vec![]));
        assert_ne!(id, other);
        assert_eq!(registry.events().len(), 2);
        assert_eq!(registry.events()[0].id, id);
    }

    #[test]
    fn test_create_stores_malformed_input_as_given() {
        let mut registry = EventRegistry::new();
        let id = add(
            &mut registry,
            draft("Backwards", vec![session("2030-01-01", "12:00", "09:00")]),
        );
        assert!(!registry.by_id(id).unwrap().schedule[0].is_well_formed());
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut registry = EventRegistry::new();
        let mut new_event = draft("Lab", vec![session("2030-01-01", "10:00", "11:00")]);
        new_event.max_attendees = Some(2);
        let id = add(&mut registry, new_event);

        assert_eq!(registry.register(id, "a"), RegistrationOutcome::Registered);
        assert_eq!(registry.register(id, "b"), RegistrationOutcome::Registered);
        assert_eq!(registry.register(id, "c"), RegistrationOutcome::Full);
        assert_eq!(registry.register(id, "d"), RegistrationOutcome::Full);
        assert_eq!(registry.by_id(id).unwrap().attendees, vec!["a", "b"]);
    }

    #[test]
    fn test_double_registration_is_rejected() {
        let mut registry = EventRegistry::new();
        let id = add(&mut registry, draft("Talk", vec![session("2030-01-01", "10:00", "11:00")]));

        assert!(registry.register(id, "u").is_registered());
        assert_eq!(registry.register(id, "u"), RegistrationOutcome::AlreadyRegistered);
        assert_eq!(registry.by_id(id).unwrap().attendees, vec!["u"]);
    }

    #[test]
    fn test_duplicate_takes_precedence_over_full() {
        let mut registry = EventRegistry::new();
        let mut new_event = draft("Tiny", vec![session("2030-01-01", "10:00", "11:00")]);
        new_event.max_attendees = Some(1);
        let id = add(&mut registry, new_event);

        registry.register(id, "u");
        assert_eq!(registry.register(id, "u"), RegistrationOutcome::AlreadyRegistered);
    }

    #[test]
    fn test_register_unknown_event() {
        let mut registry = EventRegistry::new();
        assert_eq!(
            registry.register(Uuid::new_v4(), "u"),
            RegistrationOutcome::NotFound
        );
    }

    #[test]
    fn test_touching_sessions_are_not_a_conflict() {
        let mut registry = EventRegistry::new();
        let a = add(&mut registry, draft("A", vec![session("2030-01-01", "10:00", "11:00")]));
        let b = add(&mut registry, draft("B", vec![session("2030-01-01", "11:00", "12:00")]));

        assert!(registry.register(a, "u").is_registered());
        assert!(registry.register(b, "u").is_registered());
    }

    #[test]
    fn test_overlapping_session_is_a_conflict() {
        let mut registry = EventRegistry::new();
        let a = add(&mut registry, draft("A", vec![session("2030-01-01", "10:00", "11:00")]));
        let b = add(&mut registry, draft("B", vec![session("2030-01-01", "10:30", "11:30")]));

        assert!(registry.register(a, "u").is_registered());
        assert_eq!(
            registry.register(b, "u"),
            RegistrationOutcome::Conflict { event_id: a }
        );
        assert!(registry.by_id(b).unwrap().attendees.is_empty());
        // Another user is unaffected.
        assert!(registry.register(b, "v").is_registered());
    }

    #[test]
    fn test_conflict_checks_every_session_of_both_events() {
        let mut registry = EventRegistry::new();
        let workshop = add(
            &mut registry,
            draft(
                "Workshop",
                vec![
                    session("2030-01-01", "08:00", "09:00"),
                    session("2030-01-03", "14:00", "16:00"),
                ],
            ),
        );
        let course = add(
            &mut registry,
            draft(
                "Course",
                vec![
                    session("2030-01-02", "14:00", "16:00"),
                    session("2030-01-03", "15:00", "17:00"),
                ],
            ),
        );

        assert!(registry.register(workshop, "u").is_registered());
        assert_eq!(
            registry.register(course, "u"),
            RegistrationOutcome::Conflict { event_id: workshop }
        );
        let conflicts = registry.conflicts_for(course, "u");
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, workshop);
    }

    #[test]
    fn test_conflicts_outlive_the_user_id() {
        let mut registry = EventRegistry::new();
        let a = add(&mut registry, draft("A", vec![session("2030-01-01", "10:00", "11:00")]));
        let b = add(&mut registry, draft("B", vec![session("2030-01-01", "10:30", "11:30")]));
        assert!(registry.register(a, "user-7").is_registered());

        let conflicts = {
            let user_id = format!("user-{}", 7);
            registry.conflicts_for(b, &user_id)
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, a);
    }

    #[test]
    fn test_conflict_only_considers_current_registrations() {
        let mut registry = EventRegistry::new();
        let a = add(&mut registry, draft("A", vec![session("2030-01-01", "10:00", "11:00")]));
        let b = add(&mut registry, draft("B", vec![session("2030-01-01", "10:00", "11:00")]));

        assert!(registry.register(a, "u").is_registered());
        assert!(registry.unregister(a, "u"));
        assert!(registry.register(b, "u").is_registered());
    }

    #[test]
    fn test_unregister_does_not_promote_waitlist() {
        let mut registry = EventRegistry::new();
        let mut new_event = draft("Full", vec![session("2030-01-01", "10:00", "11:00")]);
        new_event.max_attendees = Some(1);
        let id = add(&mut registry, new_event);

        registry.register(id, "first");
        assert!(registry.join_waitlist(id, "second"));
        assert!(registry.unregister(id, "first"));

        let event = registry.by_id(id).unwrap();
        assert!(event.attendees.is_empty());
        assert_eq!(event.waitlist, vec!["second"]);
    }

    #[test]
    fn test_unregister_non_member_is_noop() {
        let mut registry = EventRegistry::new();
        let id = add(&mut registry, draft("A", vec![]));
        assert!(!registry.unregister(id, "nobody"));
        assert!(!registry.unregister(Uuid::new_v4(), "nobody"));
    }

    #[test]
    fn test_waitlist_is_idempotent_and_fifo() {
        let mut registry = EventRegistry::new();
        let id = add(&mut registry, draft("A", vec![]));

        assert!(registry.join_waitlist(id, "u1"));
        assert!(!registry.join_waitlist(id, "u1"));
        assert!(registry.join_waitlist(id, "u2"));
        assert_eq!(registry.by_id(id).unwrap().waitlist, vec!["u1", "u2"]);
        assert!(registry.is_in_waitlist(id, "u1"));

        assert!(!registry.leave_waitlist(id, "stranger"));
        assert!(registry.leave_waitlist(id, "u1"));
        assert!(!registry.is_in_waitlist(id, "u1"));
        assert_eq!(registry.by_id(id).unwrap().waitlist, vec!["u2"]);
    }

    #[test]
    fn test_waitlist_on_unknown_event() {
        let mut registry = EventRegistry::new();
        let id = Uuid::new_v4();
        assert!(!registry.join_waitlist(id, "u"));
        assert!(!registry.is_in_waitlist(id, "u"));
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut registry = EventRegistry::new();
        let mut new_event = draft("Old", vec![session("2030-01-01", "10:00", "11:00")]);
        new_event.location = Some("Room 1".to_string());
        let id = add(&mut registry, new_event);
        registry.register(id, "u");

        let patch = EventPatch {
            title: Some("New".to_string()),
            location: Some(None),
            max_attendees: Some(Some(10)),
            ..EventPatch::default()
        };
        let updated = registry.update(id, patch).unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, "Old description");
        assert_eq!(updated.location, None);
        assert_eq!(updated.max_attendees, Some(10));
        assert_eq!(updated.attendees, vec!["u"]);

        assert!(registry.update(Uuid::new_v4(), EventPatch::default()).is_none());
    }

    #[test]
    fn test_delete_leaves_sub_events_orphaned() {
        let mut registry = EventRegistry::new();
        let main = add(&mut registry, draft("Main", vec![]));
        let mut sub = draft("Sub", vec![]);
        sub.parent_id = Some(main);
        let sub = add(&mut registry, sub);

        assert!(registry.orphaned_sub_events().is_empty());
        let removed = registry.delete(main).unwrap();
        assert_eq!(removed.id, main);
        assert!(registry.delete(main).is_none());

        assert_eq!(registry.by_id(sub).unwrap().parent_id, Some(main));
        let orphans = registry.orphaned_sub_events();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, sub);
    }

    #[test]
    fn test_hierarchy_partition() {
        let mut registry = EventRegistry::new();
        let week = add(&mut registry, draft("Week", vec![]));
        let fair = add(&mut registry, draft("Fair", vec![]));
        let mut talk = draft("Talk", vec![]);
        talk.parent_id = Some(week);
        let talk = add(&mut registry, talk);
        let mut lab = draft("Lab", vec![]);
        lab.parent_id = Some(week);
        let lab = add(&mut registry, lab);

        let main_ids: Vec<Uuid> = registry.main_events().iter().map(|e| e.id).collect();
        assert_eq!(main_ids, vec![week, fair]);
        let sub_ids: Vec<Uuid> = registry.sub_events(week).iter().map(|e| e.id).collect();
        assert_eq!(sub_ids, vec![talk, lab]);
        assert!(registry.sub_events(fair).is_empty());

        for event in registry.events() {
            let is_main = event.is_main();
            let is_sub = event.parent_id.map(|p| registry.is_main_event(p)).unwrap_or(false);
            assert!(is_main ^ is_sub);
        }
    }

    #[test]
    fn test_by_user_lists_registrations_in_collection_order() {
        let mut registry = EventRegistry::new();
        let a = add(&mut registry, draft("A", vec![session("2030-01-01", "08:00", "09:00")]));
        let _b = add(&mut registry, draft("B", vec![session("2030-01-01", "09:00", "10:00")]));
        let c = add(&mut registry, draft("C", vec![session("2030-01-01", "10:00", "11:00")]));

        registry.register(c, "u");
        registry.register(a, "u");
        let ids: Vec<Uuid> = registry.by_user("u").iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(registry.by_user("nobody").is_empty());
    }

    #[test]
    fn test_upcoming_orders_by_earliest_future_session() {
        let mut registry = EventRegistry::new();
        let past = add(&mut registry, draft("Past", vec![session("2030-01-01", "09:00", "10:00")]));
        let late = add(&mut registry, draft("Late", vec![session("2030-03-01", "09:00", "10:00")]));
        let mixed = add(
            &mut registry,
            draft(
                "Mixed",
                vec![
                    session("2030-01-01", "08:00", "09:00"),
                    session("2030-02-15", "09:00", "10:00"),
                ],
            ),
        );
        let early = add(&mut registry, draft("Early", vec![session("2030-02-01", "09:00", "10:00")]));

        let ids: Vec<Uuid> = registry
            .upcoming_at(at("2030-01-15 12:00"))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![early, mixed, late]);
        assert!(!ids.contains(&past));
    }

    #[test]
    fn test_upcoming_is_stable_and_strict() {
        let mut registry = EventRegistry::new();
        let first = add(&mut registry, draft("First", vec![session("2030-02-01", "09:00", "10:00")]));
        let second = add(&mut registry, draft("Second", vec![session("2030-02-01", "09:00", "10:00")]));
        let starting_now = add(&mut registry, draft("Now", vec![session("2030-01-15", "12:00", "13:00")]));

        let ids: Vec<Uuid> = registry
            .upcoming_at(at("2030-01-15 12:00"))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
        assert!(!ids.contains(&starting_now));
    }

    #[test]
    fn test_calendar_views() {
        let mut registry = EventRegistry::new();
        let main = add(
            &mut registry,
            draft(
                "Week",
                vec![
                    session("2030-04-01", "08:00", "18:00"),
                    session("2030-04-02", "08:00", "12:00"),
                    session("2030-04-02", "14:00", "18:00"),
                ],
            ),
        );
        let mut talk = draft("Talk", vec![session("2030-04-02", "10:00", "11:00")]);
        talk.parent_id = Some(main);
        let talk = add(&mut registry, talk);

        let day: NaiveDate = "2030-04-02".parse().unwrap();
        assert_eq!(
            registry.event_dates(main).unwrap(),
            vec!["2030-04-01".parse::<NaiveDate>().unwrap(), day]
        );
        assert!(registry.event_dates(Uuid::new_v4()).is_none());

        let calendar = registry.calendar();
        assert_eq!(calendar.len(), 2);
        let on_day: Vec<Uuid> = calendar[&day].iter().map(|e| e.id).collect();
        assert_eq!(on_day, vec![main, talk]);

        assert_eq!(registry.events_on(day).len(), 2);
        let subs: Vec<Uuid> = registry.sub_events_on(main, day).iter().map(|e| e.id).collect();
        assert_eq!(subs, vec![talk]);
        assert!(registry
            .sub_events_on(main, "2030-04-01".parse().unwrap())
            .is_empty());
    }
}
