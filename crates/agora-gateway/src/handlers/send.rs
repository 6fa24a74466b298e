use agora_core::config::PUBLIC_CHAT_NAME;
use agora_core::error::{AgoraError, Result};
use agora_core::messages;
use agora_core::time::format_timestamp;
use agora_moderation::{check_ban, check_rate_limit, BanOutcome, RateLimitOutcome};
use agora_users::User;
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::{store_err, user_err};

/// POST /send (auth). Body: `{"send_to": <string>="public_chat", "message": <non-empty string>}`.
pub fn handle(state: &AppState, caller: &User, body: &Value) -> Result<(u16, Value)> {
    let send_to = body
        .get("send_to")
        .and_then(Value::as_str)
        .unwrap_or(PUBLIC_CHAT_NAME);
    let text = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AgoraError::BadRequest("message".to_string()))?;

    if send_to == PUBLIC_CHAT_NAME {
        send_to_public(state, caller, text)
    } else {
        send_to_private(state, caller, send_to, text)
    }
}

fn send_to_public(state: &AppState, caller: &User, text: &str) -> Result<(u16, Value)> {
    let now = Utc::now();
    let membership = state
        .chats
        .get_membership(state.public_chat_id, caller.id)
        .map_err(store_err)?
        .ok_or_else(|| AgoraError::NotFound(PUBLIC_CHAT_NAME.to_string()))?;

    match check_ban(&membership, now) {
        BanOutcome::Banned => return Ok((200, json!({ "warning": messages::YOU_ARE_BANNED }))),
        BanOutcome::Cleared => {
            state
                .chats
                .update_moderation(state.public_chat_id, caller.id, 0, false, None)
                .map_err(store_err)?;
        }
        BanOutcome::NotBanned => {}
    }

    match check_rate_limit(
        caller.messages_in_hour_in_public_chat,
        caller.start_chatting_in_public_chat,
        now,
    ) {
        RateLimitOutcome::Refuse { finish_time } => {
            return Ok((
                200,
                json!({
                    "warning": format!(
                        "message limit has been reached, please wait until {}",
                        format_timestamp(finish_time)
                    )
                }),
            ));
        }
        RateLimitOutcome::Accept {
            new_count,
            new_window_start,
        } => {
            state
                .users
                .update_rate_limit(caller.id, new_count, new_window_start)
                .map_err(user_err)?;
        }
    }

    state
        .chats
        .insert_message(state.public_chat_id, caller.id, text)
        .map_err(store_err)?;
    state
        .chats
        .update_last_connect(state.public_chat_id, caller.id, now)
        .map_err(store_err)?;
    Ok((201, json!({ "info": messages::MESSAGE_SENT })))
}

fn send_to_private(state: &AppState, caller: &User, send_to: &str, text: &str) -> Result<(u16, Value)> {
    let now = Utc::now();
    let target = state
        .users
        .find_by_name(send_to)
        .map_err(user_err)?
        .ok_or_else(|| AgoraError::NotFound(send_to.to_string()))?;

    // Find-or-create plus the two bootstrap memberships happen in one
    // transaction, so two concurrent first messages between the same pair
    // can't each create their own chat.
    let (chat, created) = state
        .chats
        .get_or_create_private_chat(caller.id, target.id)
        .map_err(store_err)?;

    if !created {
        let membership = state
            .chats
            .get_membership(chat.id, caller.id)
            .map_err(store_err)?
            .ok_or_else(|| AgoraError::NotFound(send_to.to_string()))?;

        match check_ban(&membership, now) {
            BanOutcome::Banned => return Ok((200, json!({ "warning": messages::YOU_ARE_BANNED }))),
            BanOutcome::Cleared => {
                state
                    .chats
                    .update_moderation(chat.id, caller.id, 0, false, None)
                    .map_err(store_err)?;
            }
            BanOutcome::NotBanned => {}
        }
    }

    state.chats.insert_message(chat.id, caller.id, text).map_err(store_err)?;
    state
        .chats
        .update_last_connect(chat.id, caller.id, now)
        .map_err(store_err)?;
    Ok((201, json!({ "info": messages::MESSAGE_SENT })))
}
