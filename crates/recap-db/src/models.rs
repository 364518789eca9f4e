//! Database row types — these map directly to SQLite rows.
//! Distinct from the recap-types wire models to keep the DB layer independent.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use recap_types::models::{Chat, Message, MessageSender, User};
use uuid::Uuid;

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ChatRow {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A chat joined with its owner's identity, for list responses.
pub struct ChatWithOwnerRow {
    pub chat: ChatRow,
    pub owner_name: String,
    pub owner_email: String,
}

pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub seq: i64,
    pub sender: String,
    pub content: String,
    pub images: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("corrupt {} timestamp '{}'", column, raw))
}

impl UserRow {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(&self.id).context("corrupt user id")?,
            name: self.name,
            email: self.email,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
        })
    }
}

impl ChatRow {
    pub fn into_chat(self) -> Result<Chat> {
        Ok(Chat {
            id: Uuid::parse_str(&self.id).context("corrupt chat id")?,
            name: self.name,
            user_id: Uuid::parse_str(&self.user_id).context("corrupt chat user_id")?,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
        })
    }
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: Uuid::parse_str(&self.id).context("corrupt message id")?,
            chat_id: Uuid::parse_str(&self.chat_id).context("corrupt message chat_id")?,
            seq: self.seq,
            sender: self
                .sender
                .parse::<MessageSender>()
                .context("corrupt message sender")?,
            content: self.content,
            images: serde_json::from_str(&self.images).context("corrupt message images")?,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
        })
    }
}
