use std::sync::Arc;

use chatvault_db::{Database, StoreError};
use chatvault_types::ChatKind;
use tracing::info;

/// Message count cap for a full export when the caller does not choose one.
pub const DEFAULT_FULL_EXPORT_LIMIT: u32 = 1000;
/// Hard cap a caller-chosen full-export limit is clamped to.
pub const MAX_FULL_EXPORT_LIMIT: u32 = 10_000;

/// How the caller wants the history walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Export from the beginning, bounded by `limit` (clamped to
    /// [`MAX_FULL_EXPORT_LIMIT`], defaulting to
    /// [`DEFAULT_FULL_EXPORT_LIMIT`]). Ignores any stored watermark.
    Full { limit: Option<u32> },
    /// Only messages newer than the stored watermark, unbounded.
    /// Falls back to a default full export when no watermark exists.
    Incremental,
}

/// Concrete fetch range handed to the history walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRange {
    /// Fetch only messages with id strictly greater than this.
    pub from_id: Option<i64>,
    /// Maximum number of messages; None means unbounded.
    pub limit: Option<u32>,
}

/// Sole owner of ExportWatermark records. The watermark per
/// (user, chat, kind) is the maximum message id already written to an
/// exported artifact, and it only ever moves forward.
pub struct ExportTracker {
    db: Arc<Database>,
}

impl ExportTracker {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn resolve_range(
        &self,
        user_id: i64,
        chat_id: i64,
        kind: ChatKind,
        mode: ExportMode,
    ) -> Result<ExportRange, StoreError> {
        let full = |limit: Option<u32>| ExportRange {
            from_id: None,
            limit: Some(limit.unwrap_or(DEFAULT_FULL_EXPORT_LIMIT).min(MAX_FULL_EXPORT_LIMIT)),
        };

        match mode {
            ExportMode::Full { limit } => Ok(full(limit)),
            ExportMode::Incremental => match self.db.watermark(user_id, chat_id, kind)? {
                Some(last_id) => Ok(ExportRange {
                    from_id: Some(last_id),
                    limit: None,
                }),
                None => Ok(full(None)),
            },
        }
    }

    /// Record a completed export. Callers must only invoke this after
    /// every message in the run reached the artifact; the store keeps
    /// the maximum, so stale calls can never regress the watermark.
    pub fn record_result(
        &self,
        user_id: i64,
        chat_id: i64,
        kind: ChatKind,
        max_message_id: i64,
    ) -> Result<(), StoreError> {
        self.db
            .advance_watermark(user_id, chat_id, kind, max_message_id)?;
        info!(
            "watermark advanced for user_id={user_id} chat_id={chat_id} kind={kind}: {max_message_id}"
        );
        Ok(())
    }

    pub fn watermark(
        &self,
        user_id: i64,
        chat_id: i64,
        kind: ChatKind,
    ) -> Result<Option<i64>, StoreError> {
        self.db.watermark(user_id, chat_id, kind)
    }
}
