use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{events, health_check, registration, waitlist};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/events/upcoming", get(events::upcoming_events))
        .route("/events/main", get(events::main_events))
        .route("/events/calendar", get(events::calendar))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/sub-events", get(events::sub_events))
        .route("/events/:id/dates", get(events::event_dates))
        .route(
            "/events/:id/registration",
            post(registration::register).delete(registration::unregister),
        )
        .route(
            "/events/:id/waitlist",
            get(waitlist::status)
                .post(waitlist::join)
                .delete(waitlist::leave),
        )
        .route("/me/events", get(events::my_events))
}
