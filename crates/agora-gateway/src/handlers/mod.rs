pub mod comment;
pub mod connect;
pub mod get_token;
pub mod report;
pub mod send;
pub mod status;

use agora_core::time::format_timestamp;
use agora_store::{Comment, Message};
use agora_users::UserStore;
use serde_json::{json, Value};

/// Render one message for `/connect`'s `messages`/`unread_messages` arrays.
pub(crate) fn message_json(users: &UserStore, message: &Message, comments: &[Comment]) -> agora_core::error::Result<Value> {
    let author = users
        .find_by_id(message.author_id)
        .map_err(crate::errors::user_err)?
        .map(|u| u.user_name)
        .unwrap_or_default();
    Ok(json!({
        "id": message.id,
        "pub_date": format_timestamp(message.pub_date),
        "author": author,
        "message_text": message.text,
        "message_comments": comments.iter().map(comment_json).collect::<Vec<_>>(),
    }))
}

fn comment_json(comment: &Comment) -> Value {
    json!({
        "id": comment.id,
        "text": comment.text,
        "created": format_timestamp(comment.created),
    })
}
