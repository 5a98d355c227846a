//! `WireGuard` key material.
//!
//! `WireGuard` uses Curve25519 for key exchange. Keys are 32 bytes and
//! travel base64-encoded, which is also how configs store them.

use std::fmt;

use base64::Engine;
use rand_core::{OsRng, RngCore};
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{ConfigError, Result};

/// `WireGuard` key size in bytes (256-bit Curve25519 keys).
pub const KEY_SIZE: usize = 32;

/// Keys produced for one node by a key generator.
#[derive(Clone)]
pub struct KeyMaterial {
    /// Base64 private key.
    pub private_key: String,
    /// Base64 public key derived from `private_key`.
    pub public_key: String,
    /// Base64 pre-shared key, when one was requested.
    pub pre_shared_key: Option<String>,
}

impl KeyMaterial {
    /// Generates a fresh key pair, plus a pre-shared key if asked.
    #[must_use]
    pub fn generate(with_pre_shared_key: bool) -> Self {
        let private = generate_private_bytes();
        Self {
            private_key: encode(&private),
            public_key: derive(&private),
            pre_shared_key: with_pre_shared_key.then(generate_preshared_key),
        }
    }

    /// Re-derives the public key from an existing private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is not 32 bytes of base64.
    pub fn from_private_key(private_key: &str, with_pre_shared_key: bool) -> Result<Self> {
        let private_key = strip_whitespace(private_key);
        let public_key = public_key_from_private(&private_key)?;
        Ok(Self {
            private_key,
            public_key,
            pre_shared_key: with_pre_shared_key.then(generate_preshared_key),
        })
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field(
                "pre_shared_key",
                &self.pre_shared_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        let psk_eq = match (&self.pre_shared_key, &other.pre_shared_key) {
            (Some(a), Some(b)) => a.as_bytes().ct_eq(b.as_bytes()).into(),
            (None, None) => true,
            _ => false,
        };
        bool::from(self.private_key.as_bytes().ct_eq(other.private_key.as_bytes()))
            && self.public_key == other.public_key
            && psk_eq
    }
}

impl Eq for KeyMaterial {}

/// Generates a new base64 private key, clamped the way `wg genkey` does.
#[must_use]
pub fn generate_private_key() -> String {
    encode(&generate_private_bytes())
}

/// Derives the base64 public key for a base64 private key.
///
/// # Errors
///
/// Returns an error if the input is not valid base64 or wrong length.
pub fn public_key_from_private(private_key: &str) -> Result<String> {
    let bytes = decode_key(private_key)?;
    Ok(derive(&bytes))
}

/// Generates a new base64 pre-shared key from OS entropy.
#[must_use]
pub fn generate_preshared_key() -> String {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    encode(&key)
}

/// Decodes a base64 key into its 32 raw bytes.
///
/// # Errors
///
/// Returns an error if the input is not valid base64 or wrong length.
pub fn decode_key(key: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(key.trim())
        .map_err(|e| ConfigError::InvalidBase64(e.to_string()))?;
    if bytes.len() != KEY_SIZE {
        return Err(ConfigError::InvalidKeyLength(bytes.len()));
    }
    let mut arr = [0u8; KEY_SIZE];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Removes all whitespace, as keys read from tool output carry newlines.
#[must_use]
pub fn strip_whitespace(key: &str) -> String {
    key.chars().filter(|c| !c.is_whitespace()).collect()
}

fn generate_private_bytes() -> [u8; KEY_SIZE] {
    let secret = StaticSecret::random_from_rng(OsRng);
    let mut bytes = secret.to_bytes();
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
    bytes
}

fn derive(private: &[u8; KEY_SIZE]) -> String {
    let secret = StaticSecret::from(*private);
    let public = X25519PublicKey::from(&secret);
    encode(public.as_bytes())
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_private_key_is_32_bytes() {
        let key = generate_private_key();
        assert_eq!(decode_key(&key).expect("decode").len(), KEY_SIZE);
        assert_eq!(key.len(), 44);
    }

    #[test]
    fn generated_private_key_is_clamped() {
        let bytes = decode_key(&generate_private_key()).expect("decode");
        assert_eq!(bytes[0] & 7, 0);
        assert_eq!(bytes[31] & 128, 0);
        assert_eq!(bytes[31] & 64, 64);
    }

    #[test]
    fn public_key_derivation_is_deterministic() {
        let private = generate_private_key();
        let a = public_key_from_private(&private).expect("derive");
        let b = public_key_from_private(&private).expect("derive");
        assert_eq!(a, b);
    }

    #[test]
    fn different_private_keys_produce_different_public_keys() {
        let a = KeyMaterial::generate(false);
        let b = KeyMaterial::generate(false);
        assert_ne!(a.public_key, b.public_key);
    }

    #[test]
    fn known_vector_from_rfc7748() {
        // Alice's key pair from RFC 7748 section 6.1.
        let private = encode(&[
            0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2,
            0x66, 0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5,
            0x1d, 0xb9, 0x2c, 0x2a,
        ]);
        let expected = encode(&[
            0x85, 0x20, 0xf0, 0x09, 0x89, 0x30, 0xa7, 0x54, 0x74, 0x8b, 0x7d, 0xdc, 0xb4, 0x3e,
            0xf7, 0x5a, 0x0d, 0xbf, 0x3a, 0x0d, 0x26, 0x38, 0x1a, 0xf4, 0xeb, 0xa4, 0xa9, 0x8e,
            0xaa, 0x9b, 0x4e, 0x6a,
        ]);
        assert_eq!(public_key_from_private(&private).expect("derive"), expected);
    }

    #[test]
    fn from_private_key_strips_whitespace() {
        let generated = KeyMaterial::generate(false);
        let reparsed =
            KeyMaterial::from_private_key(&format!(" {}\n", generated.private_key), false)
                .expect("valid key");
        assert_eq!(reparsed, generated);
    }

    #[test]
    fn pre_shared_key_only_when_requested() {
        assert!(KeyMaterial::generate(false).pre_shared_key.is_none());
        let psk = KeyMaterial::generate(true).pre_shared_key.expect("psk");
        assert_eq!(decode_key(&psk).expect("decode").len(), KEY_SIZE);
    }

    #[test]
    fn debug_redacts_secrets() {
        let keys = KeyMaterial::generate(true);
        let debug = format!("{keys:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&keys.private_key));
        assert!(debug.contains(&keys.public_key));
    }

    #[test]
    fn invalid_keys_rejected() {
        assert!(matches!(
            public_key_from_private("not base64!"),
            Err(ConfigError::InvalidBase64(_))
        ));
        assert!(matches!(
            public_key_from_private(&encode(&[1u8; 16])),
            Err(ConfigError::InvalidKeyLength(16))
        ));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn derivation_accepts_any_32_bytes(bytes in prop::array::uniform32(any::<u8>())) {
                let derived = public_key_from_private(&encode(&bytes));
                prop_assert!(derived.is_ok());
            }
        }
    }
}
