use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::RngCore;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::db::{row_to_user, select_clause};
use crate::error::Result;
use crate::types::User;

const TOKEN_BYTES: usize = 16;

/// Owns the `users` table. Wraps the same single-writer connection the rest
/// of the server shares; every method acquires, uses, and releases the lock
/// on every exit path.
pub struct UserStore {
    db: Arc<Mutex<rusqlite::Connection>>,
}

impl UserStore {
    pub fn new(db: Arc<Mutex<rusqlite::Connection>>) -> Self {
        Self { db }
    }

    pub fn find_by_name(&self, user_name: &str) -> Result<Option<User>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE user_name = ?1", select_clause());
        conn.query_row(&sql, params![user_name], row_to_user)
            .optional()
            .map_err(Into::into)
    }

    pub fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE token = ?1", select_clause());
        conn.query_row(&sql, params![token], row_to_user)
            .optional()
            .map_err(Into::into)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.db.lock().unwrap();
        let sql = format!("{} WHERE id = ?1", select_clause());
        conn.query_row(&sql, params![id], row_to_user)
            .optional()
            .map_err(Into::into)
    }

    /// Create a user with a freshly generated token, retrying on the
    /// astronomically rare collision with an existing token.
    pub fn create(&self, user_name: &str) -> Result<User> {
        let conn = self.db.lock().unwrap();
        loop {
            let token = generate_token();
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM users WHERE token = ?1",
                    params![token],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                debug!("token collision, regenerating");
                continue;
            }
            conn.execute(
                "INSERT INTO users (user_name, token, messages_in_hour_in_public_chat, start_chatting_in_public_chat)
                 VALUES (?1, ?2, 0, NULL)",
                params![user_name, token],
            )?;
            let id = conn.last_insert_rowid();
            return Ok(User {
                id,
                user_name: user_name.to_string(),
                token,
                messages_in_hour_in_public_chat: 0,
                start_chatting_in_public_chat: None,
            });
        }
    }

    /// Overwrite the public-chat rate-limit counters for a user.
    pub fn update_rate_limit(
        &self,
        user_id: i64,
        messages_in_hour: i64,
        window_start: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "UPDATE users SET messages_in_hour_in_public_chat = ?2, start_chatting_in_public_chat = ?3 WHERE id = ?1",
            params![user_id, messages_in_hour, window_start],
        )?;
        Ok(())
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
