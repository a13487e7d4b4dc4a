//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in envelope encryption operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Input is malformed before any key is involved: bad base64, an
    /// undersized ciphertext, or a salt/DEK of the wrong length.
    #[error("corrupted encryption data: {0}")]
    CorruptedData(String),

    /// AEAD tag verification failed: wrong PIN or tampered data.
    /// Deliberately carries no detail; the two cases are indistinguishable.
    #[error("decryption failed (wrong PIN or tampered data)")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    Encryption(String),
}
