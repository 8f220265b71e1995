use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// One contiguous session of an event, on a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
}

impl ScheduleEntry {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time
    }

    /// Half-open overlap on the same date. A session ending exactly when the
    /// other starts does not overlap it.
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub schedule: Vec<ScheduleEntry>,
    pub organizer: String,
    pub organizer_id: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub waitlist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn from_new(id: Uuid, created_at: DateTime<Utc>, new_event: NewEvent) -> Self {
        Self {
            id,
            title: new_event.title,
            description: new_event.description,
            schedule: new_event.schedule,
            organizer: new_event.organizer,
            organizer_id: new_event.organizer_id,
            attendees: Vec::new(),
            waitlist: Vec::new(),
            max_attendees: new_event.max_attendees,
            location: new_event.location,
            category: new_event.category,
            image_url: new_event.image_url,
            parent_id: new_event.parent_id,
            created_at,
        }
    }

    pub fn is_main(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_attendee(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|id| id == user_id)
    }

    pub fn is_waitlisted(&self, user_id: &str) -> bool {
        self.waitlist.iter().any(|id| id == user_id)
    }

    pub fn is_full(&self) -> bool {
        match self.max_attendees {
            Some(max) => self.attendees.len() >= max as usize,
            None => false,
        }
    }

    pub fn has_session_on(&self, date: NaiveDate) -> bool {
        self.schedule.iter().any(|s| s.date == date)
    }

    /// Earliest session start strictly after `now`.
    pub fn next_start_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.schedule
            .iter()
            .map(ScheduleEntry::starts_at)
            .filter(|start| *start > now)
            .min()
    }

    pub fn overlaps_with(&self, other: &Event) -> bool {
        self.schedule
            .iter()
            .any(|mine| other.schedule.iter().any(|theirs| mine.overlaps(theirs)))
    }

    pub fn apply(&mut self, patch: EventPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
        }
        if let Some(organizer) = patch.organizer {
            self.organizer = organizer;
        }
        if let Some(organizer_id) = patch.organizer_id {
            self.organizer_id = organizer_id;
        }
        if let Some(max_attendees) = patch.max_attendees {
            self.max_attendees = max_attendees;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(parent_id) = patch.parent_id {
            self.parent_id = parent_id;
        }
    }
}

/// Everything an organizer supplies when creating an event. The registry
/// fills in the id, creation time and the empty attendee and waitlist sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub organizer_id: String,
    #[serde(default)]
    pub max_attendees: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Partial update. Absent fields are left untouched; for the optional
/// fields an explicit `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<Vec<ScheduleEntry>>,
    pub organizer: Option<String>,
    pub organizer_id: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub max_attendees: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<Uuid>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Session times travel as `HH:MM`, or `HH:MM:SS` when the seconds are set.
mod wall_clock {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";
    const FORMAT_WITH_SECONDS: &str = "%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let format = if time.second() == 0 {
            FORMAT
        } else {
            FORMAT_WITH_SECONDS
        };
        serializer.collect_str(&time.format(format))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, FORMAT_WITH_SECONDS))
            .map_err(serde::de::Error::custom)
    }
}
