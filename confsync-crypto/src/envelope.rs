//! The wire envelope: versioned salt + wrapped DEK + document ciphertext.

use crate::cipher::{decrypt_bytes, encrypt, encrypt_bytes};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_kek, generate_dek, Salt, SymmetricKey, KEY_SIZE, SALT_SIZE};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use zeroize::Zeroize;

/// Client-side encryption scheme versions understood by this engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncryptionVersion {
    /// Plaintext on the wire (server-side protection only).
    None,
    /// PBKDF2 KEK + AES-256-GCM wrapped DEK + AES-256-GCM document.
    V1,
}

impl EncryptionVersion {
    /// Maps a remote-reported version number, `None` for unknown versions.
    pub fn from_wire(version: u32) -> Option<Self> {
        match version {
            0 => Some(Self::None),
            1 => Some(Self::V1),
            _ => None,
        }
    }

    pub fn wire(self) -> u32 {
        match self {
            Self::None => 0,
            Self::V1 => 1,
        }
    }
}

/// Everything the remote store needs to hold for an encrypted document.
/// All fields are base64 strings, ready for transmission.
#[derive(Clone, Debug)]
pub struct EncryptionEnvelope {
    pub version: EncryptionVersion,
    pub salt: String,
    pub wrapped_dek: String,
    pub ciphertext: String,
}

/// Wraps a DEK under the KEK derived from `pin` and `salt`, returning the
/// base64 wrapped blob. Uses the same AEAD as document encryption.
pub fn wrap_dek(dek: &SymmetricKey, pin: &str, salt: &Salt) -> CryptoResult<String> {
    let kek = derive_kek(pin, salt);
    Ok(BASE64.encode(encrypt_bytes(dek.as_bytes(), &kek)?))
}

/// Unwraps a base64 wrapped DEK. Fails with `DecryptionFailed` when the
/// PIN is wrong (tag mismatch), `CorruptedData` when the blob is malformed.
pub fn unwrap_dek(wrapped_b64: &str, pin: &str, salt: &Salt) -> CryptoResult<SymmetricKey> {
    let kek = derive_kek(pin, salt);
    let wire = BASE64
        .decode(wrapped_b64)
        .map_err(|e| CryptoError::CorruptedData(format!("invalid wrapped DEK base64: {e}")))?;

    let mut plain = decrypt_bytes(&wire, &kek)?;
    if plain.len() != KEY_SIZE {
        plain.zeroize();
        return Err(CryptoError::CorruptedData(format!(
            "unwrapped DEK is {} bytes, expected {KEY_SIZE}",
            plain.len()
        )));
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&plain);
    plain.zeroize();
    Ok(SymmetricKey::from_bytes(bytes))
}

/// Builds a complete fresh envelope for `document`: new random salt, new
/// random DEK, DEK wrapped under the PIN-derived KEK.
///
/// Also returns the raw DEK so the caller can cache it and avoid
/// re-prompting for the PIN on the next operation.
pub fn generate_payload(
    document: &str,
    pin: &str,
) -> CryptoResult<(EncryptionEnvelope, SymmetricKey)> {
    let salt = Salt::random();
    let dek = generate_dek();

    let wrapped_dek = wrap_dek(&dek, pin, &salt)?;
    let ciphertext = encrypt(document, &dek)?;

    let envelope = EncryptionEnvelope {
        version: EncryptionVersion::V1,
        salt: encode_salt(&salt),
        wrapped_dek,
        ciphertext,
    };
    Ok((envelope, dek))
}

/// Decodes a base64 salt, enforcing the exact expected length.
pub fn decode_salt(b64: &str) -> CryptoResult<Salt> {
    let bytes = BASE64
        .decode(b64)
        .map_err(|e| CryptoError::CorruptedData(format!("invalid salt base64: {e}")))?;
    let arr: [u8; SALT_SIZE] = bytes.as_slice().try_into().map_err(|_| {
        CryptoError::CorruptedData(format!(
            "salt is {} bytes, expected {SALT_SIZE}",
            bytes.len()
        ))
    })?;
    Ok(Salt::from_bytes(arr))
}

pub fn encode_salt(salt: &Salt) -> String {
    BASE64.encode(salt.as_bytes())
}
