use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce, Tag, aead::AeadInPlace};
use rand_core::RngCore;

use crate::cipher::Cipher;
use crate::error::CipherError;
use crate::rng::secure_rng;

pub const AEAD_KEY_BYTES: usize = 32;
pub const AEAD_NONCE_BYTES: usize = 12;
pub const AEAD_TAG_BYTES: usize = 16;

/// ChaCha20-Poly1305 behind the [`Cipher`] contract, for comparison against
/// the classical ciphers. Output layout is `nonce || ciphertext || tag`.
#[derive(Clone)]
pub struct ReferenceCipher {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for ReferenceCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceCipher").finish_non_exhaustive()
    }
}

impl ReferenceCipher {
    pub fn new(key: [u8; AEAD_KEY_BYTES]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        }
    }

    pub fn from_slice(key: &[u8]) -> Result<Self, CipherError> {
        let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| CipherError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt_with_nonce(
        &self,
        nonce: &[u8; AEAD_NONCE_BYTES],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let mut out = Vec::with_capacity(AEAD_NONCE_BYTES + plaintext.len() + AEAD_TAG_BYTES);
        out.extend_from_slice(nonce);
        out.extend_from_slice(plaintext);
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(nonce), &[], &mut out[AEAD_NONCE_BYTES..])
            .map_err(|_| CipherError::AeadError)?;
        out.extend_from_slice(tag.as_slice());
        Ok(out)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() < AEAD_NONCE_BYTES + AEAD_TAG_BYTES {
            return Err(CipherError::AeadError);
        }
        let (nonce, rest) = ciphertext.split_at(AEAD_NONCE_BYTES);
        let (body, tag_bytes) = rest.split_at(rest.len() - AEAD_TAG_BYTES);
        let mut out = body.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce),
                &[],
                &mut out,
                Tag::from_slice(tag_bytes),
            )
            .map_err(|_| CipherError::AeadError)?;
        Ok(out)
    }
}

impl Cipher for ReferenceCipher {
    fn name(&self) -> &'static str {
        "chacha20-poly1305"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce = [0u8; AEAD_NONCE_BYTES];
        secure_rng().fill_bytes(&mut nonce);
        self.encrypt_with_nonce(&nonce, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        ReferenceCipher::decrypt(self, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_nonce_per_message() {
        let cipher = ReferenceCipher::new([1u8; AEAD_KEY_BYTES]);
        let a = Cipher::encrypt(&cipher, b"same message").unwrap();
        let b = Cipher::encrypt(&cipher, b"same message").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), AEAD_NONCE_BYTES + 12 + AEAD_TAG_BYTES);
        assert_eq!(cipher.decrypt(&a).unwrap(), b"same message");
    }

    #[test]
    fn tampering_is_detected() {
        let cipher = ReferenceCipher::new([2u8; AEAD_KEY_BYTES]);
        let mut ciphertext = cipher.encrypt_with_nonce(&[0u8; 12], b"tamper").unwrap();
        ciphertext[AEAD_NONCE_BYTES] ^= 0x01;
        assert_eq!(cipher.decrypt(&ciphertext).unwrap_err(), CipherError::AeadError);
        assert_eq!(cipher.decrypt(&[0u8; 27]).unwrap_err(), CipherError::AeadError);
    }

    #[test]
    fn key_length_checked() {
        assert_eq!(
            ReferenceCipher::from_slice(&[0u8; 16]).unwrap_err(),
            CipherError::InvalidKey
        );
        assert!(ReferenceCipher::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn debug_output_hides_key() {
        let cipher = ReferenceCipher::new([0xAB; AEAD_KEY_BYTES]);
        let rendered = format!("{cipher:?}");
        assert_eq!(rendered, "ReferenceCipher { .. }");
    }
}
