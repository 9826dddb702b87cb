use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use ts_rs::TS;

use super::ApiError;
use crate::registry::{
    PresenceRegistry,
    identity::{UserId, resolve_user_id},
    user::UserProfile,
};

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateResponse {
    pub status: String,
    #[ts(type = "number")]
    pub id: UserId,
}

/// POST /api/update
/// Record a heartbeat for the user named in the body
///
/// The body is parsed without looking at `Content-Type`. Display fields that
/// are missing or not strings fall back to their defaults.
pub async fn update_user(
    State(registry): State<Arc<PresenceRegistry>>,
    body: Bytes,
) -> Result<Json<UpdateResponse>, ApiError> {
    let data: Map<String, Value> = serde_json::from_slice(&body)?;
    let id = resolve_user_id(data.get("id"))?;

    let profile = UserProfile {
        first_name: string_field(&data, "first_name"),
        last_name: string_field(&data, "last_name"),
        username: string_field(&data, "username"),
    };
    registry.upsert(id, profile).await;

    Ok(Json(UpdateResponse {
        status: "ok".to_string(),
        id,
    }))
}

/// Any method on /api/update other than POST (OPTIONS is answered by CORS)
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}
