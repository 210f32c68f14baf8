use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::router::{scheduling_routes, SchedulingState};
use scheduling_cell::services::booking::BookingCoordinator;
use scheduling_cell::services::calendar::SupabaseCalendarStore;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    // The calendar store is built once and injected; nothing scheduling-
    // related lives in process-wide state.
    let store = Arc::new(SupabaseCalendarStore::new(&config));
    let coordinator = Arc::new(BookingCoordinator::new(store));

    let state = SchedulingState {
        config: config.clone(),
        coordinator,
    };

    Router::new()
        .route("/", get(|| async { "Vitalis scheduling API is running!" }))
        .nest("/appointments", scheduling_routes(state))
}
