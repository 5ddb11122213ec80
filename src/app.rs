use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(handlers::get_status))
        .route(
            "/api/profile",
            get(handlers::get_profile)
                .post(handlers::create_profile)
                .patch(handlers::update_profile),
        )
        .route("/api/cycle", get(handlers::get_cycle))
        .route("/api/periods", get(handlers::list_periods).post(handlers::log_period))
        .route("/api/moods", get(handlers::list_moods).post(handlers::log_mood))
        .route("/api/link-code", get(handlers::get_link_code))
        .route("/api/partner", get(handlers::get_partner).post(handlers::link_partner))
        .route("/api/partner/notification", get(handlers::get_partner_notification))
        .route("/api/notify", post(handlers::send_notification))
        .route("/api/messages/next", get(handlers::next_message))
        .route("/api/messages/rotation", delete(handlers::reset_rotation))
        .route("/api/settings", get(handlers::get_settings).put(handlers::put_settings))
        .route("/api/data", delete(handlers::clear_data))
        .with_state(state)
}
