use rusqlite::{Connection, Result, Row};

use crate::types::{Chat, ChatType, Comment, Membership, Message};

pub(crate) const CHAT_SELECT_SQL: &str = "SELECT id, name, chat_type, created FROM chats";
pub(crate) const MEMBERSHIP_SELECT_SQL: &str =
    "SELECT chat_id, user_id, last_connect, cautions, banned, banned_till FROM chats_users";
pub(crate) const MESSAGE_SELECT_SQL: &str =
    "SELECT id, text, pub_date, author_id, chat_id FROM messages";
pub(crate) const COMMENT_SELECT_SQL: &str =
    "SELECT id, text, created, author_id, message_id FROM comments";

pub(crate) fn row_to_chat(row: &Row<'_>) -> Result<Chat> {
    let chat_type_str: String = row.get(2)?;
    Ok(Chat {
        id: row.get(0)?,
        name: row.get(1)?,
        chat_type: ChatType::from_db_str(&chat_type_str).unwrap_or(ChatType::Private),
        created: row.get(3)?,
    })
}

pub(crate) fn row_to_membership(row: &Row<'_>) -> Result<Membership> {
    Ok(Membership {
        chat_id: row.get(0)?,
        user_id: row.get(1)?,
        last_connect: row.get(2)?,
        cautions: row.get(3)?,
        banned: row.get::<_, i64>(4)? != 0,
        banned_till: row.get(5)?,
    })
}

pub(crate) fn row_to_message(row: &Row<'_>) -> Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        author_id: row.get(3)?,
        chat_id: row.get(4)?,
    })
}

pub(crate) fn row_to_comment(row: &Row<'_>) -> Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        text: row.get(1)?,
        created: row.get(2)?,
        author_id: row.get(3)?,
        message_id: row.get(4)?,
    })
}

/// Initialise chats/chats_users/messages/comments. Foreign keys with
/// `ON DELETE CASCADE` give us the cascade rules from the data model for
/// free: deleting a chat drops its messages, deleting a message drops its
/// comments.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS chats (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            chat_type   TEXT NOT NULL,
            created     TEXT NOT NULL,
            private_key TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_public_singleton
            ON chats (name) WHERE chat_type = 'public';

        CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_private_pair
            ON chats (private_key) WHERE chat_type = 'private';

        CREATE TABLE IF NOT EXISTS chats_users (
            chat_id      INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
            user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            last_connect TEXT,
            cautions     INTEGER NOT NULL DEFAULT 0,
            banned       INTEGER NOT NULL DEFAULT 0,
            banned_till  TEXT,
            PRIMARY KEY (chat_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            pub_date    TEXT NOT NULL,
            author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            chat_id     INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_chat_pub_date
            ON messages (chat_id, pub_date);

        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            created     TEXT NOT NULL,
            author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE
        );",
    )
}
