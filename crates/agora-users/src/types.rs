use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered chat participant. Created on first successful `/get-token`
/// and never deleted by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub token: String,
    pub messages_in_hour_in_public_chat: i64,
    pub start_chatting_in_public_chat: Option<DateTime<Utc>>,
}
