use agora_core::error::{AgoraError, Result};
use agora_core::messages;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::{store_err, user_err};

/// POST /get-token (unauth). Body: `{"user_name": <string>}`.
pub fn handle(state: &AppState, body: &Value) -> Result<(u16, Value)> {
    let user_name = body
        .get("user_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(AgoraError::Unauthorized)?;

    if state.users.find_by_name(user_name).map_err(user_err)?.is_some() {
        return Ok((200, json!({ "info": messages::HAD_TOKEN })));
    }

    let user = state.users.create(user_name).map_err(user_err)?;
    state
        .chats
        .add_membership(state.public_chat_id, user.id)
        .map_err(store_err)?;
    Ok((200, json!({ "token": user.token })))
}
