use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("block cipher key must not be empty")]
    InvalidKey,

    #[error("ciphertext length {len} is not a positive multiple of the block size")]
    InvalidCiphertextLength { len: usize },

    #[error("block cipher padding is malformed")]
    InvalidPadding,

    #[error("encoded message does not fit below the public modulus")]
    MessageTooLarge,

    #[error("no square root carries a matching checksum")]
    DecryptionAmbiguous,

    #[error("key size {bits} bits is unsupported: expected an even size of at least 16 bits")]
    InvalidKeySize { bits: u64 },

    #[error("invalid prime factor: {0}")]
    InvalidPrimeFactor(&'static str),

    #[error("AEAD operation failed")]
    AeadError,
}
