use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::identity::UserId;

/// Shown when a heartbeat carries no first name.
pub const DEFAULT_FIRST_NAME: &str = "User";

/// Latest known state of one tracked user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserPresence {
    #[ts(type = "number")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    /// Unix seconds of the most recent heartbeat.
    #[ts(type = "number")]
    pub last_seen: i64,
}

/// Optional display fields carried by a heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl UserProfile {
    pub fn into_presence(self, id: UserId, last_seen: i64) -> UserPresence {
        UserPresence {
            id,
            first_name: self
                .first_name
                .unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
            last_name: self.last_name.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            last_seen,
        }
    }
}
