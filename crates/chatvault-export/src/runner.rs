use std::io::Write;

use async_trait::async_trait;
use chatvault_db::StoreError;
use chatvault_platform::PlatformError;
use chatvault_types::ChatKind;
use thiserror::Error;
use tracing::info;

use crate::range::{ExportMode, ExportRange, ExportTracker};
use crate::render::{ExportMessage, render_message};

/// History walker boundary. The production implementation lives behind
/// the platform bridge; tests script it.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Messages in `range` for one chat, oldest first. `from_id` is
    /// exclusive: only ids strictly greater are returned.
    async fn fetch(
        &self,
        chat_id: i64,
        kind: ChatKind,
        range: &ExportRange,
    ) -> Result<Vec<ExportMessage>, PlatformError>;
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("history fetch failed: {0}")]
    Fetch(#[from] PlatformError),
    #[error("artifact write failed: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ExportOutcome {
    pub exported: usize,
    pub last_message_id: Option<i64>,
}

/// Walk one chat's history into `out` and advance the watermark.
///
/// The watermark moves only after every rendered message reached the
/// artifact; any fetch or write failure aborts before `record_result`,
/// so a retried run re-fetches the same range instead of losing it.
pub async fn run_export<S: MessageSource, W: Write>(
    source: &S,
    tracker: &ExportTracker,
    out: &mut W,
    user_id: i64,
    chat_id: i64,
    kind: ChatKind,
    mode: ExportMode,
) -> Result<ExportOutcome, ExportError> {
    let range = tracker.resolve_range(user_id, chat_id, kind, mode)?;
    let messages = source.fetch(chat_id, kind, &range).await?;

    let mut exported = 0usize;
    let mut max_id: Option<i64> = None;
    for message in &messages {
        let Some(line) = render_message(message) else {
            continue;
        };
        writeln!(out, "{line}")?;
        exported += 1;
        max_id = Some(max_id.map_or(message.id, |m| m.max(message.id)));
    }

    if let Some(last_id) = max_id {
        out.flush()?;
        tracker.record_result(user_id, chat_id, kind, last_id)?;
    }

    info!("export finished for user_id={user_id} chat_id={chat_id}: {exported} messages");
    Ok(ExportOutcome {
        exported,
        last_message_id: max_id,
    })
}
