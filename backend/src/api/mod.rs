pub mod assignments;
pub mod bookings;
pub mod facilities;
pub mod maintenance;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        // Facilities
        .route("/api/facilities", get(facilities::list))
        .route("/api/facilities/:id", get(facilities::get_one))
        .route("/api/facilities/:id/ratings", post(facilities::create_rating))
        // Bookings
        .route("/api/bookings", get(bookings::list).post(bookings::create))
        .route("/api/bookings/:id", get(bookings::get_one))
        .route("/api/bookings/:id/status", patch(bookings::update_status))
        .route("/api/bookings/:id/cancel", post(bookings::cancel))
        // Maintenance reports
        .route("/api/maintenance", get(maintenance::list).post(maintenance::create))
        .route(
            "/api/maintenance/:id",
            get(maintenance::get_one).patch(maintenance::update),
        )
        // Staff-facility assignments
        .route("/api/assignments", get(assignments::list).post(assignments::create))
        .route("/api/assignments/:id", delete(assignments::remove))
        .with_state(state)
}
