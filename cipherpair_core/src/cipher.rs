//! Shared byte-level contract for every cipher the simulation can drive.

use crate::error::CipherError;

/// Opaque encrypt/decrypt pair.
///
/// Implementations are immutable after construction, so a single instance
/// may be shared across threads for read-only use.
pub trait Cipher: Send + Sync {
    /// Short human-readable algorithm name.
    fn name(&self) -> &'static str;

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

impl<C: Cipher + ?Sized> Cipher for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        (**self).decrypt(ciphertext)
    }
}
