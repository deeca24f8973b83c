/// HTTP surface for the login flow. Thin axum handlers over
/// `chatvault_auth::AuthFlow`; all real decisions happen in the flow.
pub mod auth;
pub mod error;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
