use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chats (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chats_user
            ON chats(user_id, created_at);

        -- seq is the append position within a chat: assigned in the same
        -- transaction as the insert, so message order is exactly call order.
        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT NOT NULL PRIMARY KEY,
            chat_id     TEXT NOT NULL REFERENCES chats(id),
            seq         INTEGER NOT NULL,
            sender      TEXT NOT NULL CHECK (sender IN ('user', 'model')),
            content     TEXT NOT NULL,
            images      TEXT NOT NULL DEFAULT '[]',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            UNIQUE(chat_id, seq)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_chat
            ON messages(chat_id, seq);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
