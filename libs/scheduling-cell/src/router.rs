// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::BookingCoordinator;

#[derive(Clone)]
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub coordinator: Arc<BookingCoordinator>,
}

pub fn scheduling_routes(state: SchedulingState) -> Router {
    // All scheduling operations require a resolved requester identity.
    let protected_routes = Router::new()
        .route("/book", post(handlers::book_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/doctor", get(handlers::get_doctor_appointments))
        .route("/patient", get(handlers::get_patient_appointments))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
