use chatvault_crypto::CredentialCipher;
use chatvault_types::ChatKind;
use rusqlite::OptionalExtension;

use crate::models::{AccountRow, LoginStage, PendingLogin};
use crate::{Database, StoreError, unix_now};

impl Database {
    // -- Accounts --

    /// Upsert the long-lived session for a user. The plaintext is
    /// encrypted before it reaches SQL; a fresh row starts
    /// unauthenticated, an existing row keeps its flag.
    pub fn save_session(
        &self,
        cipher: &CredentialCipher,
        user_id: i64,
        session: &str,
    ) -> Result<(), StoreError> {
        let session_cipher = cipher.encrypt(session)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO accounts (user_id, session_cipher, is_authenticated, last_activity)
                 VALUES (?1, ?2, 0, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     session_cipher = excluded.session_cipher,
                     last_activity = excluded.last_activity",
                (user_id, &session_cipher, unix_now()),
            )?;
            Ok(())
        })
    }

    pub fn set_authenticated(&self, user_id: i64, value: bool) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET is_authenticated = ?2, last_activity = ?3 WHERE user_id = ?1",
                (user_id, value, unix_now()),
            )?;
            Ok(())
        })
    }

    pub fn is_authenticated(&self, user_id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let flag: Option<bool> = conn
                .query_row(
                    "SELECT is_authenticated FROM accounts WHERE user_id = ?1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(flag.unwrap_or(false))
        })
    }

    pub fn account(&self, user_id: i64) -> Result<Option<AccountRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, session_cipher, is_authenticated, last_activity,
                            api_id_cipher, api_hash_cipher
                     FROM accounts WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(AccountRow {
                            user_id: row.get(0)?,
                            session_cipher: row.get(1)?,
                            is_authenticated: row.get(2)?,
                            last_activity: row.get(3)?,
                            api_id_cipher: row.get(4)?,
                            api_hash_cipher: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Decrypted session for a user, or None if no account exists.
    /// Surfaces `CorruptCredential` instead of plaintext garbage.
    pub fn session(
        &self,
        cipher: &CredentialCipher,
        user_id: i64,
    ) -> Result<Option<String>, StoreError> {
        let Some(row) = self.account(user_id)? else {
            return Ok(None);
        };
        Ok(Some(cipher.decrypt(&row.session_cipher)?))
    }

    /// Per-user platform API credentials, decrypted. None when the user
    /// relies on the process-wide default.
    pub fn api_credentials(
        &self,
        cipher: &CredentialCipher,
        user_id: i64,
    ) -> Result<Option<(i32, String)>, StoreError> {
        let Some(row) = self.account(user_id)? else {
            return Ok(None);
        };
        let (Some(id_cipher), Some(hash_cipher)) = (row.api_id_cipher, row.api_hash_cipher) else {
            return Ok(None);
        };
        let api_id: i32 = cipher
            .decrypt(&id_cipher)?
            .parse()
            .map_err(|_| StoreError::CorruptCredential)?;
        let api_hash = cipher.decrypt(&hash_cipher)?;
        Ok(Some((api_id, api_hash)))
    }

    pub fn set_api_credentials(
        &self,
        cipher: &CredentialCipher,
        user_id: i64,
        api_id: i32,
        api_hash: &str,
    ) -> Result<(), StoreError> {
        let id_cipher = cipher.encrypt(&api_id.to_string())?;
        let hash_cipher = cipher.encrypt(api_hash)?;
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET api_id_cipher = ?2, api_hash_cipher = ?3 WHERE user_id = ?1",
                (user_id, &id_cipher, &hash_cipher),
            )?;
            Ok(())
        })
    }

    pub fn has_api_credentials(&self, user_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .account(user_id)?
            .map(|row| row.api_id_cipher.is_some() && row.api_hash_cipher.is_some())
            .unwrap_or(false))
    }

    /// Logout: remove the account, any in-flight login and all export
    /// watermarks for the user in one transaction.
    pub fn delete_account_data(&self, user_id: i64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM accounts WHERE user_id = ?1", [user_id])?;
            tx.execute("DELETE FROM pending_logins WHERE user_id = ?1", [user_id])?;
            tx.execute("DELETE FROM export_watermarks WHERE user_id = ?1", [user_id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Pending logins --

    /// Single-slot upsert: a second send_code overwrites the prior row
    /// rather than duplicating it. The write is one statement, so a row
    /// can never mix ciphertext from one step with metadata from another.
    pub fn put_pending_login(
        &self,
        cipher: &CredentialCipher,
        user_id: i64,
        stage: LoginStage,
        phone: &str,
        phone_code_hash: &str,
        session: &str,
    ) -> Result<(), StoreError> {
        let session_cipher = cipher.encrypt(session)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pending_logins
                     (user_id, stage, phone, phone_code_hash, session_cipher, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     stage = excluded.stage,
                     phone = excluded.phone,
                     phone_code_hash = excluded.phone_code_hash,
                     session_cipher = excluded.session_cipher,
                     created_at = excluded.created_at",
                (
                    user_id,
                    stage.as_str(),
                    phone,
                    phone_code_hash,
                    &session_cipher,
                    unix_now(),
                ),
            )?;
            Ok(())
        })
    }

    pub fn pending_login(
        &self,
        cipher: &CredentialCipher,
        user_id: i64,
    ) -> Result<Option<PendingLogin>, StoreError> {
        let row = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT stage, phone, phone_code_hash, session_cipher
                     FROM pending_logins WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        let stage_raw: String = row.get(0)?;
                        let stage = LoginStage::parse(&stage_raw).ok_or_else(|| {
                            rusqlite::Error::FromSqlConversionFailure(
                                0,
                                rusqlite::types::Type::Text,
                                format!("unknown login stage: {stage_raw}").into(),
                            )
                        })?;
                        Ok((stage, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((stage, phone, phone_code_hash, session_cipher)) = row else {
            return Ok(None);
        };
        let session = cipher.decrypt(&session_cipher)?;
        Ok(Some(PendingLogin {
            stage,
            phone,
            phone_code_hash,
            session,
        }))
    }

    pub fn delete_pending_login(&self, user_id: i64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM pending_logins WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    // -- Export watermarks --

    pub fn watermark(
        &self,
        user_id: i64,
        chat_id: i64,
        kind: ChatKind,
    ) -> Result<Option<i64>, StoreError> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT last_message_id FROM export_watermarks
                     WHERE user_id = ?1 AND chat_id = ?2 AND chat_kind = ?3",
                    (user_id, chat_id, kind.as_str()),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    /// Monotonic upsert: the stored id only ever moves forward, so the
    /// result is the maximum candidate regardless of call order.
    pub fn advance_watermark(
        &self,
        user_id: i64,
        chat_id: i64,
        kind: ChatKind,
        candidate_id: i64,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO export_watermarks
                     (user_id, chat_id, chat_kind, last_message_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id, chat_id, chat_kind) DO UPDATE SET
                     last_message_id = MAX(last_message_id, excluded.last_message_id),
                     updated_at = excluded.updated_at",
                (user_id, chat_id, kind.as_str(), candidate_id, unix_now()),
            )?;
            Ok(())
        })
    }
}
