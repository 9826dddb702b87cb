use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::registry::{ACTIVITY_WINDOW_SECS, PresenceRegistry};

/// GET /api/users
/// Users seen within the activity window, in no particular order
pub async fn list_active_users(State(registry): State<Arc<PresenceRegistry>>) -> impl IntoResponse {
    Json(registry.active_users(ACTIVITY_WINDOW_SECS).await)
}
