/// Shared types for ChatVault.
///
/// API request/response bodies, the chat-kind classification and the
/// auth error taxonomy live here so the db, auth, export and api crates
/// agree on one canonical definition.
pub mod api;
pub mod error;
pub mod models;

pub use error::AuthError;
pub use models::ChatKind;
