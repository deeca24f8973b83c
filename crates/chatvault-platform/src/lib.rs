/// Messaging-platform client boundary.
///
/// The MTProto wire protocol is out of scope here; login RPCs and media
/// downloads go through a sidecar bridge speaking JSON over HTTP. The
/// `PlatformClient` trait is the seam the auth state machine and the
/// export path depend on, so tests substitute a scripted fake.
pub mod bridge;

use async_trait::async_trait;
use chatvault_types::AuthError;
use thiserror::Error;

pub use bridge::BridgeClient;

/// Platform API credentials. Either the process-wide default or a
/// per-user override decrypted from the account store.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_id: i32,
    pub api_hash: String,
}

/// Result of a send_code RPC: the opaque token needed to redeem the
/// code, plus the pre-auth session state to resume from.
#[derive(Debug, Clone)]
pub struct CodeSent {
    pub phone_code_hash: String,
    pub session: String,
}

/// Result of submitting a confirmation code.
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    /// The code was accepted outright; `session` is now authorized.
    Authorized { session: String },
    /// The account has a second factor; `session` has advanced to the
    /// password-needed state and must be persisted for step 3.
    PasswordNeeded { session: String },
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("invalid code")]
    InvalidCode,
    #[error("invalid password")]
    InvalidPassword,
    #[error("flood wait: {seconds}s")]
    FloodWait { seconds: u64 },
    #[error("platform error: {0}")]
    Other(String),
}

impl From<PlatformError> for AuthError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::InvalidPhone => Self::ProviderRejected("invalid phone number".into()),
            PlatformError::InvalidCode => Self::ProviderRejected("invalid code".into()),
            PlatformError::InvalidPassword => Self::ProviderRejected("invalid password".into()),
            PlatformError::FloodWait { seconds } => Self::ProviderRateLimited { seconds },
            PlatformError::Other(msg) => Self::ProviderTransient(msg),
        }
    }
}

#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Open a fresh login session and ask the platform to send a
    /// confirmation code to `phone`.
    async fn send_code(
        &self,
        creds: &ApiCredentials,
        phone: &str,
    ) -> Result<CodeSent, PlatformError>;

    /// Resume `session` and submit the confirmation code.
    async fn sign_in_code(
        &self,
        creds: &ApiCredentials,
        session: &str,
        phone: &str,
        code: &str,
        phone_code_hash: &str,
    ) -> Result<SignInOutcome, PlatformError>;

    /// Resume `session` and submit the second-factor password.
    /// Returns the authorized session blob.
    async fn sign_in_password(
        &self,
        creds: &ApiCredentials,
        session: &str,
        password: &str,
    ) -> Result<String, PlatformError>;

    /// Download the media payload of one message (voice notes for the
    /// transcription path).
    async fn download_media(
        &self,
        creds: &ApiCredentials,
        session: &str,
        chat_id: i64,
        message_id: i64,
    ) -> Result<Vec<u8>, PlatformError>;
}
