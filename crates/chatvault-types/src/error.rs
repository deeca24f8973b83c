use thiserror::Error;

/// Failure taxonomy for the login flow.
///
/// Every variant maps to a specific, actionable caller-facing message;
/// raw provider internals only ever reach the operational logs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The signed payload did not verify, or carried no usable identity.
    /// Terminal for the call; never retried.
    #[error("invalid auth payload: {0}")]
    InvalidAuthPayload(String),

    /// A stored ciphertext was rejected by the cipher (wrong key,
    /// truncation, tampering). The user must re-authenticate.
    #[error("stored credential is corrupt; please log in again")]
    CorruptCredential,

    /// A step-2/step-3 call arrived with no login in progress.
    #[error("no pending login found; please start from send_code")]
    NoPendingLogin,

    /// The provider rejected the submitted phone, code or password.
    /// State is preserved so the same step can be retried.
    #[error("{0}")]
    ProviderRejected(String),

    /// The provider imposed a rate limit. Surfaced with the mandated
    /// wait; the login flow never sleeps through it on its own.
    #[error("too many requests; please wait {seconds} seconds")]
    ProviderRateLimited { seconds: u64 },

    /// Network or unexpected provider failure. The caller may retry
    /// the whole step.
    #[error("provider failure: {0}")]
    ProviderTransient(String),

    /// Durable-store failure unrelated to credential integrity.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
