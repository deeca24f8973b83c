/// ChatVault authentication core.
///
/// `signature` gates every entry point against forged requests from the
/// untrusted front end; `flow` drives the three-step login state machine
/// (phone -> code -> optional password) against the platform client,
/// persisting the in-progress session at every step boundary so the flow
/// resumes purely from storage.
pub mod flow;
pub mod signature;

pub use flow::{AuthFlow, CodeConfirmation};
pub use signature::verify_init_data;
