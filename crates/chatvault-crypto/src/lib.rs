/// ChatVault credential encryption.
///
/// One process-wide AES-256-GCM key protects every credential-bearing
/// string before it reaches durable storage. AEAD means a ciphertext
/// written with a different key (or truncated, or tampered with) is
/// detected at decrypt time instead of yielding garbage.
pub mod cipher;
pub mod keys;

pub use cipher::{CredentialCipher, CryptoError};
