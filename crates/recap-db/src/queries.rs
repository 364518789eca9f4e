use crate::Database;
use crate::models::{ChatRow, ChatWithOwnerRow, MessageRow, UserRow};
use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, name: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        let now = now_rfc3339();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, name, email, password_hash, now, now],
            )?;
            Ok(UserRow {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Chats --

    pub fn insert_chat(&self, id: &str, name: &str, user_id: &str) -> Result<ChatRow> {
        let now = now_rfc3339();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO chats (id, name, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, name, user_id, now, now],
            )?;
            Ok(ChatRow {
                id: id.to_string(),
                name: name.to_string(),
                user_id: user_id.to_string(),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, name, user_id, created_at, updated_at
                     FROM chats WHERE id = ?1",
                )?
                .query_row([id], map_chat_row)
                .optional()?;
            Ok(row)
        })
    }

    /// All chats owned by a user, each joined with the owner's identity in a
    /// single query (no per-chat follow-up lookups).
    pub fn chats_for_user(&self, user_id: &str) -> Result<Vec<ChatWithOwnerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.name, c.user_id, c.created_at, c.updated_at, u.name, u.email
                 FROM chats c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.user_id = ?1
                 ORDER BY c.created_at",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ChatWithOwnerRow {
                        chat: ChatRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            user_id: row.get(2)?,
                            created_at: row.get(3)?,
                            updated_at: row.get(4)?,
                        },
                        owner_name: row.get(5)?,
                        owner_email: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Returns the new name, or None if the chat does not exist.
    pub fn rename_chat(&self, id: &str, name: &str) -> Result<Option<String>> {
        let now = now_rfc3339();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE chats SET name = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id, name, now],
            )?;
            Ok((changed > 0).then(|| name.to_string()))
        })
    }

    /// Deletes a chat together with every message that belongs to it, in one
    /// transaction. A failure part-way rolls everything back, so no orphaned
    /// messages can remain. Returns false if the chat does not exist, which
    /// also makes a repeated delete a clean not-found instead of a partial
    /// re-run.
    pub fn delete_chat_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: Option<String> = tx
                .query_row("SELECT id FROM chats WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            tx.execute("DELETE FROM messages WHERE chat_id = ?1", [id])?;
            tx.execute("DELETE FROM chats WHERE id = ?1", [id])?;

            tx.commit()?;
            Ok(true)
        })
    }

    // -- Messages --

    /// Appends a message to a chat: the next seq is assigned and the row
    /// inserted in the same transaction, so concurrent sends cannot produce
    /// duplicate positions and order is exactly call order. Bumps the owning
    /// chat's updated_at. Returns None if the chat does not exist.
    pub fn append_message(
        &self,
        id: &str,
        chat_id: &str,
        sender: &str,
        content: &str,
        images: &[String],
    ) -> Result<Option<MessageRow>> {
        let now = now_rfc3339();
        let images_json = serde_json::to_string(images)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: Option<String> = tx
                .query_row("SELECT id FROM chats WHERE id = ?1", [chat_id], |row| row.get(0))
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }

            let seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq) + 1, 0) FROM messages WHERE chat_id = ?1",
                [chat_id],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO messages (id, chat_id, seq, sender, content, images, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![id, chat_id, seq, sender, content, images_json, now, now],
            )?;

            tx.execute(
                "UPDATE chats SET updated_at = ?2 WHERE id = ?1",
                rusqlite::params![chat_id, now],
            )?;

            tx.commit()?;
            Ok(Some(MessageRow {
                id: id.to_string(),
                chat_id: chat_id.to_string(),
                seq,
                sender: sender.to_string(),
                content: content.to_string(),
                images: images_json,
                created_at: now.clone(),
                updated_at: now,
            }))
        })
    }

    /// Messages of a chat in append order.
    pub fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, seq, sender, content, images, created_at, updated_at
                 FROM messages
                 WHERE chat_id = ?1
                 ORDER BY seq",
            )?;

            let rows = stmt
                .query_map([chat_id], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        chat_id: row.get(1)?,
                        seq: row.get(2)?,
                        sender: row.get(3)?,
                        content: row.get(4)?,
                        images: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is a fixed identifier supplied by this module, never user input
    let sql = format!(
        "SELECT id, name, email, password_hash, created_at, updated_at
         FROM users WHERE {} = ?1",
        column
    );

    let row = conn
        .prepare(&sql)?
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_chat_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
