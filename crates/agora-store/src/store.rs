use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{
    row_to_chat, row_to_comment, row_to_membership, row_to_message, CHAT_SELECT_SQL,
    COMMENT_SELECT_SQL, MEMBERSHIP_SELECT_SQL, MESSAGE_SELECT_SQL,
};
use crate::error::Result;
use crate::types::{Chat, ChatType, Comment, Membership, Message};

/// Owns chats/chats_users/messages/comments. Shares the single writer
/// connection with `agora-users`; every method acquires the lock, does its
/// work in one transaction where more than one statement is involved, and
/// releases on every exit path.
pub struct ChatStore {
    db: Arc<Mutex<Connection>>,
}

impl ChatStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    /// Idempotently provision the singleton public chat. Called once at
    /// startup before the server accepts traffic.
    pub fn ensure_public_chat(&self, name: &str) -> Result<Chat> {
        let conn = self.db.lock().unwrap();
        if let Some(chat) = query_public_chat(&conn)? {
            return Ok(chat);
        }
        let now = Utc::now();
        conn.execute(
            "INSERT INTO chats (name, chat_type, created) VALUES (?1, 'public', ?2)",
            params![name, now],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Chat {
            id,
            name: name.to_string(),
            chat_type: ChatType::Public,
            created: now,
        })
    }

    pub fn get_public_chat(&self) -> Result<Option<Chat>> {
        let conn = self.db.lock().unwrap();
        query_public_chat(&conn)
    }

    pub fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE id = ?1", CHAT_SELECT_SQL);
        conn.query_row(&sql, params![chat_id], row_to_chat)
            .optional()
            .map_err(Into::into)
    }

    pub fn get_membership(&self, chat_id: i64, user_id: i64) -> Result<Option<Membership>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE chat_id = ?1 AND user_id = ?2", MEMBERSHIP_SELECT_SQL);
        conn.query_row(&sql, params![chat_id, user_id], row_to_membership)
            .optional()
            .map_err(Into::into)
    }

    /// Add a membership row with default (unmoderated) state. Used both
    /// when a newly created user joins the public chat and when a private
    /// chat is created for its two participants.
    pub fn add_membership(&self, chat_id: i64, user_id: i64) -> Result<Membership> {
        let conn = self.db.lock().unwrap();
        insert_membership(&conn, chat_id, user_id)
    }

    pub fn update_last_connect(&self, chat_id: i64, user_id: i64, when: DateTime<Utc>) -> Result<()> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "UPDATE chats_users SET last_connect = ?3 WHERE chat_id = ?1 AND user_id = ?2",
            params![chat_id, user_id, when],
        )?;
        Ok(())
    }

    /// Overwrite the moderation fields of a membership (cautions/ban state).
    pub fn update_moderation(
        &self,
        chat_id: i64,
        user_id: i64,
        cautions: i64,
        banned: bool,
        banned_till: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "UPDATE chats_users SET cautions = ?3, banned = ?4, banned_till = ?5 WHERE chat_id = ?1 AND user_id = ?2",
            params![chat_id, user_id, cautions, banned as i64, banned_till],
        )?;
        Ok(())
    }

    /// The unique PRIVATE chat whose members are exactly {user_a, user_b},
    /// or None if it doesn't exist yet.
    pub fn find_private_chat_between(&self, user_a: i64, user_b: i64) -> Result<Option<Chat>> {
        let conn = self.db.lock().unwrap();
        let key = private_pair_key(user_a, user_b);
        let sql = format!(
            "{} WHERE chat_type = 'private' AND private_key = ?1",
            CHAT_SELECT_SQL
        );
        conn.query_row(&sql, params![key], row_to_chat)
            .optional()
            .map_err(Into::into)
    }

    /// Atomically find-or-create the private chat between this pair.
    ///
    /// `private_key` carries a unique index (`idx_chats_private_pair`), so
    /// an `INSERT OR IGNORE` followed by a read-back under the same
    /// transaction is race-safe: if two callers race to create the same
    /// pair's first chat, only one insert succeeds and both read back the
    /// same row. Returns whether this call was the one that created it, so
    /// the caller can skip the ban check on a chat that has no history yet.
    pub fn get_or_create_private_chat(&self, user_a: i64, user_b: i64) -> Result<(Chat, bool)> {
        let mut conn = self.db.lock().unwrap();
        let tx = conn.transaction()?;
        let key = private_pair_key(user_a, user_b);
        let now = Utc::now();
        let name = format!("private-{}", now.timestamp());

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO chats (name, chat_type, created, private_key) VALUES (?1, 'private', ?2, ?3)",
            params![name, now, key],
        )?;
        let sql = format!(
            "{} WHERE chat_type = 'private' AND private_key = ?1",
            CHAT_SELECT_SQL
        );
        let chat = tx.query_row(&sql, params![key], row_to_chat)?;

        let created = inserted == 1;
        if created {
            insert_membership(&tx, chat.id, user_a)?;
            insert_membership(&tx, chat.id, user_b)?;
        }
        tx.commit()?;
        Ok((chat, created))
    }

    pub fn insert_message(&self, chat_id: i64, author_id: i64, text: &str) -> Result<Message> {
        let conn = self.db.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO messages (text, pub_date, author_id, chat_id) VALUES (?1, ?2, ?3, ?4)",
            params![text, now, author_id, chat_id],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Message {
            id,
            text: text.to_string(),
            pub_date: now,
            author_id,
            chat_id,
        })
    }

    pub fn get_message(&self, message_id: i64) -> Result<Option<Message>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE id = ?1", MESSAGE_SELECT_SQL);
        conn.query_row(&sql, params![message_id], row_to_message)
            .optional()
            .map_err(Into::into)
    }

    /// The `messages_number` most recent messages strictly before `before`,
    /// newest first.
    pub fn messages_before(&self, chat_id: i64, before: DateTime<Utc>, limit: i64) -> Result<Vec<Message>> {
        let conn = self.db.lock().unwrap();
        let sql = format!(
            "{} WHERE chat_id = ?1 AND pub_date < ?2 ORDER BY pub_date DESC LIMIT ?3",
            MESSAGE_SELECT_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![chat_id, before, limit], row_to_message)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// All messages strictly after `after`, oldest first.
    pub fn messages_after(&self, chat_id: i64, after: DateTime<Utc>) -> Result<Vec<Message>> {
        let conn = self.db.lock().unwrap();
        let sql = format!(
            "{} WHERE chat_id = ?1 AND pub_date > ?2 ORDER BY pub_date ASC",
            MESSAGE_SELECT_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![chat_id, after], row_to_message)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn insert_comment(&self, message_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let conn = self.db.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO comments (text, created, author_id, message_id) VALUES (?1, ?2, ?3, ?4)",
            params![text, now, author_id, message_id],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Comment {
            id,
            text: text.to_string(),
            created: now,
            author_id,
            message_id,
        })
    }

    pub fn comments_for_message(&self, message_id: i64) -> Result<Vec<Comment>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE message_id = ?1 ORDER BY created ASC", COMMENT_SELECT_SQL);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![message_id], row_to_comment)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Every (chat, membership) pair the user belongs to, for `/status`.
    pub fn chats_for_user(&self, user_id: i64) -> Result<Vec<(Chat, Membership)>> {
        let conn = self.db.lock().unwrap();
        let sql = "SELECT c.id, c.name, c.chat_type, c.created,
                          cu.chat_id, cu.user_id, cu.last_connect, cu.cautions, cu.banned, cu.banned_till
                   FROM chats_users cu JOIN chats c ON c.id = cu.chat_id
                   WHERE cu.user_id = ?1";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            let chat = row_to_chat(row)?;
            let membership = Membership {
                chat_id: row.get(4)?,
                user_id: row.get(5)?,
                last_connect: row.get(6)?,
                cautions: row.get(7)?,
                banned: row.get::<_, i64>(8)? != 0,
                banned_till: row.get(9)?,
            };
            Ok((chat, membership))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_messages(&self, chat_id: i64) -> Result<i64> {
        let conn = self.db.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE chat_id = ?1",
            params![chat_id],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }

    pub fn count_members(&self, chat_id: i64) -> Result<i64> {
        let conn = self.db.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM chats_users WHERE chat_id = ?1",
            params![chat_id],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }

    /// The `user_name` of the other participant of a private chat, joining
    /// against the users table this store does not otherwise own.
    pub fn other_member_name(&self, chat_id: i64, user_id: i64) -> Result<Option<String>> {
        let conn = self.db.lock().unwrap();
        conn.query_row(
            "SELECT u.user_name FROM chats_users cu
             JOIN users u ON u.id = cu.user_id
             WHERE cu.chat_id = ?1 AND cu.user_id != ?2",
            params![chat_id, user_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }
}

/// Order-independent key identifying a private chat's pair of members.
fn private_pair_key(user_a: i64, user_b: i64) -> String {
    let (lo, hi) = if user_a <= user_b { (user_a, user_b) } else { (user_b, user_a) };
    format!("{lo}:{hi}")
}

fn query_public_chat(conn: &Connection) -> Result<Option<Chat>> {
    let sql = format!("{} WHERE chat_type = 'public' LIMIT 1", CHAT_SELECT_SQL);
    conn.query_row(&sql, [], row_to_chat)
        .optional()
        .map_err(Into::into)
}

fn insert_membership(conn: &Connection, chat_id: i64, user_id: i64) -> Result<Membership> {
    conn.execute(
        "INSERT INTO chats_users (chat_id, user_id, last_connect, cautions, banned, banned_till)
         VALUES (?1, ?2, NULL, 0, 0, NULL)",
        params![chat_id, user_id],
    )?;
    Ok(Membership {
        chat_id,
        user_id,
        last_connect: None,
        cautions: 0,
        banned: false,
        banned_till: None,
    })
}
