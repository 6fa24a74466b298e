use agora_core::error::Result;
use agora_core::time::format_timestamp;
use agora_store::ChatType;
use agora_users::User;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::store_err;

/// GET /status (auth). Body is optional and its content ignored.
pub fn handle(state: &AppState, caller: &User, _body: &Value) -> Result<(u16, Value)> {
    let memberships = state.chats.chats_for_user(caller.id).map_err(store_err)?;

    let mut chats = Vec::with_capacity(memberships.len());
    for (chat, _membership) in &memberships {
        let name = match chat.chat_type {
            ChatType::Public => chat.name.clone(),
            ChatType::Private => state
                .chats
                .other_member_name(chat.id, caller.id)
                .map_err(store_err)?
                .unwrap_or_default(),
        };
        let messages_number = state.chats.count_messages(chat.id).map_err(store_err)?;
        let users_number = state.chats.count_members(chat.id).map_err(store_err)?;
        chats.push(json!({
            "name": name,
            "chat_type": chat.chat_type.as_db_str(),
            "created": format_timestamp(chat.created),
            "messages_number": messages_number,
            "users_number": users_number,
        }));
    }

    Ok((200, json!({ "connected_as": caller.user_name, "chats": chats })))
}
