//! AES-256-GCM with the `iv || tag || ciphertext` wire layout.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// GCM nonce length (bytes).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag length (bytes).
pub const TAG_SIZE: usize = 16;

/// Smallest decodable wire blob: nonce + tag with an empty body.
const MIN_WIRE_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// Encrypts `plaintext` under `key`, returning raw wire bytes
/// `iv[12] || tag[16] || ciphertext`. A fresh random IV is generated for
/// every call; an IV is never reused under the same key.
pub fn encrypt_bytes(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut iv = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut iv);

    // aes-gcm appends the tag to the ciphertext; the wire format wants it
    // up front, right after the IV.
    let sealed = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CryptoError::Encryption("AEAD seal failed".to_string()))?;
    let body_len = sealed.len() - TAG_SIZE;

    let mut wire = Vec::with_capacity(NONCE_SIZE + sealed.len());
    wire.extend_from_slice(&iv);
    wire.extend_from_slice(&sealed[body_len..]);
    wire.extend_from_slice(&sealed[..body_len]);
    Ok(wire)
}

/// Decrypts raw wire bytes produced by [`encrypt_bytes`].
///
/// Fails with `CorruptedData` if the blob is too short to contain an IV
/// and tag, and with `DecryptionFailed` if tag verification fails.
pub fn decrypt_bytes(wire: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    if wire.len() < MIN_WIRE_SIZE {
        return Err(CryptoError::CorruptedData(format!(
            "ciphertext is {} bytes, need at least {MIN_WIRE_SIZE}",
            wire.len()
        )));
    }

    let (iv, rest) = wire.split_at(NONCE_SIZE);
    let (tag, body) = rest.split_at(TAG_SIZE);

    let mut sealed = Vec::with_capacity(body.len() + TAG_SIZE);
    sealed.extend_from_slice(body);
    sealed.extend_from_slice(tag);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(iv), sealed.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypts a document string, returning `base64(iv || tag || ciphertext)`.
pub fn encrypt(plaintext: &str, key: &SymmetricKey) -> CryptoResult<String> {
    Ok(BASE64.encode(encrypt_bytes(plaintext.as_bytes(), key)?))
}

/// Decrypts a base64 wire string back to the document text.
pub fn decrypt(ciphertext_b64: &str, key: &SymmetricKey) -> CryptoResult<String> {
    let wire = BASE64
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::CorruptedData(format!("invalid base64: {e}")))?;
    let plain = decrypt_bytes(&wire, key)?;
    String::from_utf8(plain)
        .map_err(|_| CryptoError::CorruptedData("decrypted payload is not UTF-8".to_string()))
}
