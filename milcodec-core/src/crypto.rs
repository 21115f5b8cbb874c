//! Cryptographic unsealer (spec.md §4.4): optional blind FEC-trailer
//! strip, then authenticated decryption tried against ChaCha20-Poly1305
//! (primary) and XSalsa20-Poly1305/secretbox (fallback).

use std::fmt;

use chacha20poly1305::ChaCha20Poly1305;
use xsalsa20poly1305::XSalsa20Poly1305;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::DEFAULT_KEY;
use crate::errors::CryptoError;

const CHACHA_NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const FEC_TRAILER_LEN: usize = 32;

/// A 32-byte preshared symmetric key. Zeroized on drop so key material
/// doesn't linger in freed memory (spec.md §9 secret hygiene).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn default_key() -> Self {
        Self(*DEFAULT_KEY)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

fn try_chacha20poly1305(key: &SymmetricKey, nonce12: &[u8], rest: &[u8]) -> Option<Vec<u8>> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    use chacha20poly1305::Nonce;

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes()).ok()?;
    let nonce = Nonce::from_slice(nonce12);
    cipher.decrypt(nonce, rest).ok()
}

fn try_xsalsa20poly1305(key: &SymmetricKey, nonce12: &[u8], rest: &[u8]) -> Option<Vec<u8>> {
    use xsalsa20poly1305::aead::{Aead, KeyInit};
    use xsalsa20poly1305::Nonce;

    let mut nonce24 = [0u8; 24];
    nonce24[..CHACHA_NONCE_LEN].copy_from_slice(nonce12);
    let cipher = XSalsa20Poly1305::new_from_slice(key.as_bytes()).ok()?;
    let nonce = Nonce::from_slice(&nonce24);
    cipher.decrypt(nonce, rest).ok()
}

/// Try both recognized ciphers, in the order the sender is expected to
/// use them, against one interpretation of `envelope` (nonce ‖
/// ciphertext ‖ tag). Returns `CorruptData` if the envelope is too short
/// to hold a nonce and tag at all, `AuthFailure` if both ciphers reject
/// the authentication tag.
fn try_unseal_envelope(envelope: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
    if envelope.len() < CHACHA_NONCE_LEN + TAG_LEN {
        return Err(CryptoError::CorruptData);
    }

    let nonce12 = &envelope[..CHACHA_NONCE_LEN];
    let rest = &envelope[CHACHA_NONCE_LEN..];

    if let Some(plaintext) = try_chacha20poly1305(key, nonce12, rest) {
        return Ok(plaintext);
    }
    if let Some(plaintext) = try_xsalsa20poly1305(key, nonce12, rest) {
        return Ok(plaintext);
    }
    Err(CryptoError::AuthFailure)
}

/// Unseal a link-layer payload: optionally strip a blind 32-byte FEC
/// trailer, then authenticate and decrypt.
///
/// Since an RS-parity trailer can't be distinguished from the blob's own
/// shape without decoding it, both interpretations are tried: first the
/// blob as received, then (only if that fails and the blob is long
/// enough) with the last 32 bytes dropped.
pub fn unseal(blob: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
    match try_unseal_envelope(blob, key) {
        Ok(plaintext) => Ok(plaintext),
        Err(first_err) => {
            if blob.len() > FEC_TRAILER_LEN {
                if let Ok(plaintext) = try_unseal_envelope(&blob[..blob.len() - FEC_TRAILER_LEN], key) {
                    return Ok(plaintext);
                }
            }
            Err(first_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seal_chacha(key: &SymmetricKey, nonce12: &[u8; 12], plaintext: &[u8]) -> Vec<u8> {
        use chacha20poly1305::aead::{Aead, KeyInit};
        use chacha20poly1305::Nonce;

        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes()).unwrap();
        let nonce = Nonce::from_slice(nonce12);
        let mut blob = nonce12.to_vec();
        blob.extend(cipher.encrypt(nonce, plaintext).unwrap());
        blob
    }

    fn seal_xsalsa(key: &SymmetricKey, nonce12: &[u8; 12], plaintext: &[u8]) -> Vec<u8> {
        use xsalsa20poly1305::aead::{Aead, KeyInit};
        use xsalsa20poly1305::Nonce;

        let mut nonce24 = [0u8; 24];
        nonce24[..12].copy_from_slice(nonce12);
        let cipher = XSalsa20Poly1305::new_from_slice(key.as_bytes()).unwrap();
        let nonce = Nonce::from_slice(&nonce24);
        let mut blob = nonce12.to_vec();
        blob.extend(cipher.encrypt(nonce, plaintext).unwrap());
        blob
    }

    #[test]
    fn unseals_a_chacha20poly1305_envelope() {
        let key = SymmetricKey::default_key();
        let blob = seal_chacha(&key, &[7u8; 12], b"hello covert world");
        assert_eq!(unseal(&blob, &key).unwrap(), b"hello covert world");
    }

    #[test]
    fn falls_back_to_xsalsa20poly1305_when_chacha_fails() {
        let key = SymmetricKey::default_key();
        let blob = seal_xsalsa(&key, &[3u8; 12], b"fallback path");
        assert_eq!(unseal(&blob, &key).unwrap(), b"fallback path");
    }

    #[test]
    fn strips_a_blind_fec_trailer_and_still_succeeds() {
        let key = SymmetricKey::default_key();
        let mut blob = seal_chacha(&key, &[1u8; 12], b"with parity trailer");
        blob.extend(std::iter::repeat(0u8).take(32));
        assert_eq!(unseal(&blob, &key).unwrap(), b"with parity trailer");
    }

    #[test]
    fn corrupted_tag_yields_auth_failure() {
        let key = SymmetricKey::default_key();
        let mut blob = seal_chacha(&key, &[9u8; 12], b"tamper target");
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        assert!(matches!(unseal(&blob, &key), Err(CryptoError::AuthFailure)));
    }

    #[test]
    fn undersized_blob_yields_corrupt_data() {
        let key = SymmetricKey::default_key();
        let blob = vec![0u8; 10];
        assert!(matches!(unseal(&blob, &key), Err(CryptoError::CorruptData)));
    }

    #[test]
    fn wrong_key_yields_auth_failure() {
        let key = SymmetricKey::default_key();
        let other = SymmetricKey::new([5u8; 32]);
        let blob = seal_chacha(&key, &[2u8; 12], b"secret");
        assert!(matches!(unseal(&blob, &other), Err(CryptoError::AuthFailure)));
    }
}
