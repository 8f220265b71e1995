use std::sync::Arc;

use crate::services::EventService;

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventService>,
}

impl AppState {
    pub fn new(events: EventService) -> Self {
        Self {
            events: Arc::new(events),
        }
    }
}
