/// ChatVault export engine.
///
/// `range` owns the per-(user, chat, kind) watermark and turns an export
/// mode into a concrete fetch range; `runner` walks chat history into an
/// artifact and advances the watermark only after a fully successful
/// run, so an interrupted export can always be retried safely.
pub mod range;
pub mod render;
pub mod runner;
pub mod transcribe;

pub use range::{DEFAULT_FULL_EXPORT_LIMIT, ExportMode, ExportRange, ExportTracker, MAX_FULL_EXPORT_LIMIT};
pub use render::{ExportMessage, MessageContent, render_message};
pub use runner::{ExportError, ExportOutcome, MessageSource, run_export};
pub use transcribe::{TranscribeError, Transcriber};
