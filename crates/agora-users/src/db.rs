use rusqlite::{Connection, Result, Row};

use crate::types::User;

/// Map a SELECT row (column order from USER_SELECT_SQL) to a User.
/// Centralised here so every query in this crate stays consistent.
pub(crate) fn row_to_user(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        user_name: row.get(1)?,
        token: row.get(2)?,
        messages_in_hour_in_public_chat: row.get(3)?,
        start_chatting_in_public_chat: row.get(4)?,
    })
}

const USER_SELECT_SQL: &str =
    "SELECT id, user_name, token, messages_in_hour_in_public_chat, start_chatting_in_public_chat FROM users";

pub(crate) fn select_clause() -> &'static str {
    USER_SELECT_SQL
}

/// Initialise the users table. Safe to call on every startup — CREATE IF
/// NOT EXISTS makes it idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id                               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name                        TEXT NOT NULL UNIQUE,
            token                            TEXT NOT NULL UNIQUE,
            messages_in_hour_in_public_chat  INTEGER NOT NULL DEFAULT 0,
            start_chatting_in_public_chat    TEXT
        );",
    )
}
