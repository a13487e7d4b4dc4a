//! Key material: salts, symmetric keys, and PIN-based derivation.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length for PBKDF2 (bytes).
pub const SALT_SIZE: usize = 16;

/// Symmetric key length (bytes) for AES-256.
pub const KEY_SIZE: usize = 32;

/// PBKDF2-HMAC-SHA256 iteration count for KEK derivation.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// A random per-envelope KDF salt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A 256-bit symmetric key (DEK or KEK). Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

// Redacted: key bytes must never reach logs.
impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Derives the key-encryption key from a PIN and salt.
///
/// Deterministic: the same `(pin, salt)` pair always yields the same KEK.
pub fn derive_kek(pin: &str, salt: &Salt) -> SymmetricKey {
    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut out);
    SymmetricKey(out)
}

/// Generates a fresh random data-encryption key.
pub fn generate_dek() -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    SymmetricKey(bytes)
}
