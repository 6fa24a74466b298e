use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serialized as its lowercase value ("public"/"private") on the wire and
/// compared as such in `/report`; internally a plain two-valued tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Public,
    Private,
}

impl ChatType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ChatType::Public => "public",
            ChatType::Private => "private",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(ChatType::Public),
            "private" => Some(ChatType::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    pub chat_type: ChatType,
    pub created: DateTime<Utc>,
}

/// The per-(chat,user) link. Moderation state lives here: `cautions`,
/// `banned`, `banned_till`. Invariant: `banned => banned_till.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub chat_id: i64,
    pub user_id: i64,
    pub last_connect: Option<DateTime<Utc>>,
    pub cautions: i64,
    pub banned: bool,
    pub banned_till: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_id: i64,
    pub message_id: i64,
}
