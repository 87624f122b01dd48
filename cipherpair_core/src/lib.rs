//! Classical ciphers for an educational key-exchange and messaging simulation.
//!
//! Two primitives live here: a Blowfish-style Feistel block cipher and a
//! Rabin-style quadratic-residue cryptosystem. Both sit behind the same
//! byte-level [`Cipher`] contract as a ChaCha20-Poly1305 reference cipher.
//!
//! The implementation intentionally favors clarity over performance
//! and should **not** be used for production security.

pub mod aead;
pub mod cipher;
pub mod error;
pub mod feistel;
mod pi_tables;
pub mod preset;
pub mod primes;
pub mod quadratic;
pub mod rng;
pub mod versioning;

pub use crate::aead::ReferenceCipher;
pub use crate::cipher::Cipher;
pub use crate::error::CipherError;
pub use crate::feistel::{BLOCK_BYTES, BlockCipher};
pub use crate::preset::{SecurityLevel, SecurityPreset, security_preset};
pub use crate::primes::{DEFAULT_PRIMALITY_ROUNDS, extended_gcd, generate_prime, is_probably_prime};
pub use crate::quadratic::{QuadraticPrivateKey, QuadraticPublicKey, QuadraticResidueCryptosystem};
pub use crate::rng::{SecureRng, secure_rng, seeded_rng};
pub use num_bigint::BigUint;
