use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The token was not produced by the current key/algorithm.
    #[error("corrupt credential: ciphertext rejected")]
    Corrupt,
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),
    #[error("encryption failed")]
    Encrypt,
}

/// Symmetric cipher for credential-bearing strings.
///
/// Constructed once at process start from the environment key and passed
/// by reference to every component that persists credentials. Holds no
/// mutable state, so it is safe for unlimited concurrent use.
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let key = crate::keys::key_from_base64(encoded)?;
        Ok(Self::new(&key))
    }

    /// Encrypt a plaintext string into a base64 token of nonce || ciphertext.
    /// A fresh random nonce is drawn per call, so tokens are non-deterministic.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(token))
    }

    /// Decrypt a token produced by [`encrypt`](Self::encrypt).
    /// Every failure mode collapses to `Corrupt`; plaintext garbage is
    /// never returned.
    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        let raw = BASE64.decode(token).map_err(|_| CryptoError::Corrupt)?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::Corrupt);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Corrupt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Corrupt)
    }
}
