//! Envelope encryption for end-to-end protected config sync.
//!
//! Uses a two-tier key system:
//!
//! 1. **KEK**: derived from the user's PIN with PBKDF2-HMAC-SHA256
//!    (600,000 iterations). Never stored; re-derived from PIN + salt.
//! 2. **DEK**: a random 256-bit key that encrypts the configuration
//!    document. The DEK is wrapped (encrypted) under the KEK and stored
//!    alongside the ciphertext, so a PIN change only re-wraps the DEK.
//!
//! Both tiers use the same AES-256-GCM construction: key wrapping is
//! AEAD-encrypting the 32 DEK bytes, not a dedicated key-wrap mode. The
//! wire format for every ciphertext is `base64(iv[12] || tag[16] || body)`.

mod cipher;
mod envelope;
mod error;
mod key;

pub use cipher::{decrypt, decrypt_bytes, encrypt, encrypt_bytes, NONCE_SIZE, TAG_SIZE};
pub use envelope::{
    decode_salt, encode_salt, generate_payload, unwrap_dek, wrap_dek, EncryptionEnvelope,
    EncryptionVersion,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_kek, generate_dek, Salt, SymmetricKey, KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE,
};
