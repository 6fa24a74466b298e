use agora_core::error::{AgoraError, Result};
use agora_core::messages;
use agora_users::User;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::store_err;

/// POST /comment (auth). Body: `{"message_id": <int>, "comment": <non-empty string>}`.
/// An unresolved `message_id` is a 400, not a 404, by design — retained for
/// client compatibility.
pub fn handle(state: &AppState, caller: &User, body: &Value) -> Result<(u16, Value)> {
    let message_id = body
        .get("message_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AgoraError::BadRequest("message_id".to_string()))?;
    let text = body
        .get("comment")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AgoraError::BadRequest("comment".to_string()))?;

    let message = state
        .chats
        .get_message(message_id)
        .map_err(store_err)?
        .ok_or_else(|| AgoraError::BadRequest("message_id".to_string()))?;

    state
        .chats
        .insert_comment(message.id, caller.id, text)
        .map_err(store_err)?;
    Ok((201, json!({ "info": messages::COMMENT_CREATED })))
}
