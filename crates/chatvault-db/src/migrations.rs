use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS accounts (
            user_id          INTEGER PRIMARY KEY,
            session_cipher   TEXT NOT NULL,
            is_authenticated INTEGER NOT NULL DEFAULT 0,
            last_activity    INTEGER NOT NULL,
            api_id_cipher    TEXT,
            api_hash_cipher  TEXT
        );

        CREATE TABLE IF NOT EXISTS pending_logins (
            user_id          INTEGER PRIMARY KEY,
            stage            TEXT NOT NULL CHECK (stage IN ('code_requested', 'password_needed')),
            phone            TEXT NOT NULL,
            phone_code_hash  TEXT NOT NULL,
            session_cipher   TEXT NOT NULL,
            created_at       INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS export_watermarks (
            user_id          INTEGER NOT NULL,
            chat_id          INTEGER NOT NULL,
            chat_kind        TEXT NOT NULL CHECK (chat_kind IN ('direct', 'group', 'broadcast')),
            last_message_id  INTEGER NOT NULL,
            updated_at       INTEGER NOT NULL,
            PRIMARY KEY (user_id, chat_id, chat_kind)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
