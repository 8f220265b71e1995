pub mod event;
pub mod user;

pub use event::{Event, EventPatch, NewEvent, ScheduleEntry};
pub use user::{CurrentUser, Role};
