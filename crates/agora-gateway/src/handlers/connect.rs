use agora_core::config::{DEFAULT_CONNECT_MESSAGES, PUBLIC_CHAT_NAME};
use agora_core::error::{AgoraError, Result};
use agora_users::User;
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::{store_err, user_err};
use crate::handlers::message_json;

/// POST /connect (auth). Body: `{"chat_with": <string>="public_chat", "messages_number": <int>=20}`.
pub fn handle(state: &AppState, caller: &User, body: &Value) -> Result<(u16, Value)> {
    let chat_with = body
        .get("chat_with")
        .and_then(Value::as_str)
        .unwrap_or(PUBLIC_CHAT_NAME);
    let messages_number = body
        .get("messages_number")
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_CONNECT_MESSAGES);

    let chat = if chat_with == PUBLIC_CHAT_NAME {
        state
            .chats
            .get_chat(state.public_chat_id)
            .map_err(store_err)?
            .ok_or_else(|| AgoraError::NotFound(chat_with.to_string()))?
    } else {
        let target = state
            .users
            .find_by_name(chat_with)
            .map_err(user_err)?
            .ok_or_else(|| AgoraError::NotFound(chat_with.to_string()))?;

        match state
            .chats
            .find_private_chat_between(caller.id, target.id)
            .map_err(store_err)?
        {
            Some(chat) => chat,
            // Private chats are created lazily on first /send, never here.
            None => return Ok((200, json!({ "messages": [] }))),
        }
    };

    let membership = state
        .chats
        .get_membership(chat.id, caller.id)
        .map_err(store_err)?
        .ok_or_else(|| AgoraError::NotFound(chat_with.to_string()))?;
    let last_connect = membership.last_connect.unwrap_or(chat.created);

    let before = state
        .chats
        .messages_before(chat.id, last_connect, messages_number)
        .map_err(store_err)?;
    let after = state
        .chats
        .messages_after(chat.id, last_connect)
        .map_err(store_err)?;

    let mut messages = Vec::with_capacity(before.len());
    for message in &before {
        let comments = state.chats.comments_for_message(message.id).map_err(store_err)?;
        messages.push(message_json(&state.users, message, &comments)?);
    }
    let mut unread_messages = Vec::with_capacity(after.len());
    for message in &after {
        let comments = state.chats.comments_for_message(message.id).map_err(store_err)?;
        unread_messages.push(message_json(&state.users, message, &comments)?);
    }

    state
        .chats
        .update_last_connect(chat.id, caller.id, Utc::now())
        .map_err(store_err)?;

    Ok((200, json!({ "messages": messages, "unread_messages": unread_messages })))
}
