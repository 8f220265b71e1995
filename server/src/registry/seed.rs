use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use super::EventRegistry;
use crate::models::{NewEvent, ScheduleEntry};

const DEMO_ORGANIZER_ID: &str = "organizer-id";

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

fn demo_event(
    title: &str,
    description: &str,
    organizer: &str,
    schedule: Vec<ScheduleEntry>,
    max_attendees: u32,
    location: &str,
    category: &str,
) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        description: description.to_string(),
        schedule,
        organizer: organizer.to_string(),
        organizer_id: DEMO_ORGANIZER_ID.to_string(),
        max_attendees: Some(max_attendees),
        location: Some(location.to_string()),
        category: Some(category.to_string()),
        image_url: None,
        parent_id: None,
    }
}

/// Demo dataset used when nothing has been saved yet: a three-day tech week
/// with three sessions hanging off it, starting two weeks after `today`.
pub fn demo_registry(today: NaiveDate) -> EventRegistry {
    let day = |offset: i64| today + Duration::days(14 + offset);
    let mut registry = EventRegistry::new();

    let week = registry
        .create(demo_event(
            "Technology Week",
            "A full week of talks, workshops and hackathons on current technology.",
            "Computer Science Department",
            vec![
                ScheduleEntry::new(day(0), hm(8, 0), hm(18, 0)),
                ScheduleEntry::new(day(1), hm(8, 0), hm(18, 0)),
                ScheduleEntry::new(day(2), hm(8, 0), hm(12, 0)),
            ],
            500,
            "Main Campus",
            "Technology",
        ))
        .id;

    let sessions = [
        demo_event(
            "React and Node.js Workshop",
            "Build modern applications with React on the frontend and Node.js on the backend.",
            "Prof. Maria Santos",
            vec![ScheduleEntry::new(day(0), hm(14, 0), hm(17, 0))],
            30,
            "Computer Lab 1",
            "Programming",
        ),
        demo_event(
            "Artificial Intelligence Talk",
            "Where AI is heading and what it means for the job market.",
            "Prof. Carlos Pereira",
            vec![ScheduleEntry::new(day(1), hm(10, 0), hm(12, 0))],
            100,
            "Main Auditorium",
            "Artificial Intelligence",
        ),
        demo_event(
            "Docker Short Course",
            "Containerize your applications with Docker.",
            "Prof. Ana Souza",
            vec![
                ScheduleEntry::new(day(1), hm(14, 0), hm(17, 0)),
                ScheduleEntry::new(day(2), hm(9, 0), hm(12, 0)),
            ],
            25,
            "Networks Lab",
            "DevOps",
        ),
    ];

    let created_at = Utc::now();
    for mut session in sessions {
        session.parent_id = Some(week);
        registry.create_at(session, created_at);
    }

    tracing::info!(events = registry.events().len(), "Seeded demo events");
    registry
}
