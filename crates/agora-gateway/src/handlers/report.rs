use agora_core::error::{AgoraError, Result};
use agora_core::messages;
use agora_moderation::{apply_report, ReportOutcome};
use agora_store::ChatType;
use agora_users::User;
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::{store_err, user_err};

/// POST /report (auth). Body: `{"report_on": <user_name>, "chat_type": "public"|"private"}`.
pub fn handle(state: &AppState, caller: &User, body: &Value) -> Result<(u16, Value)> {
    let report_on = body
        .get("report_on")
        .and_then(Value::as_str)
        .ok_or_else(|| AgoraError::BadRequest("report_on".to_string()))?;
    let chat_type = body
        .get("chat_type")
        .and_then(Value::as_str)
        .and_then(ChatType::from_db_str)
        .ok_or_else(|| AgoraError::BadRequest("chat_type".to_string()))?;

    let target = state
        .users
        .find_by_name(report_on)
        .map_err(user_err)?
        .ok_or_else(|| AgoraError::BadRequest("report_on".to_string()))?;

    let chat = match chat_type {
        ChatType::Public => state
            .chats
            .get_chat(state.public_chat_id)
            .map_err(store_err)?
            .ok_or_else(|| AgoraError::NotFound("public_chat".to_string()))?,
        ChatType::Private => match state
            .chats
            .find_private_chat_between(caller.id, target.id)
            .map_err(store_err)?
        {
            Some(chat) => chat,
            None => {
                return Ok((200, json!({ "warning": messages::CANNOT_REPORT_STRANGER })));
            }
        },
    };

    let membership = state
        .chats
        .get_membership(chat.id, target.id)
        .map_err(store_err)?
        .ok_or_else(|| AgoraError::NotFound(report_on.to_string()))?;

    let now = Utc::now();
    match apply_report(&membership, now) {
        ReportOutcome::AlreadyBanned => Ok((201, json!({ "info": messages::USER_CURRENTLY_BANNED }))),
        ReportOutcome::CautionAdded { cautions } => {
            state
                .chats
                .update_moderation(chat.id, target.id, cautions, false, None)
                .map_err(store_err)?;
            Ok((201, json!({ "info": messages::REPORT_SENT })))
        }
        ReportOutcome::Banned { cautions, banned_till } => {
            state
                .chats
                .update_moderation(chat.id, target.id, cautions, true, Some(banned_till))
                .map_err(store_err)?;
            Ok((201, json!({ "info": messages::REPORT_SENT })))
        }
    }
}
