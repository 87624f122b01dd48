//! RNG helpers distinguishing reproducible labelled RNGs from the system RNG.
//!
//! Prime generation and AEAD nonces draw from an OS-backed `OsRng` by
//! default. Tests, benches and golden vectors instead derive a `ChaCha20Rng`
//! from a label hashed with BLAKE3 so every run sees the same stream.

use blake3::Hasher;
use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

/// Convenience alias for the OS-backed RNG used for key generation.
pub type SecureRng = OsRng;

/// Deterministic RNG derived from a label.
pub fn seeded_rng(label: &[u8]) -> ChaCha20Rng {
    let mut hasher = Hasher::new();
    hasher.update(b"cipherpair::seeded-rng");
    hasher.update(label);
    let digest = hasher.finalize();
    ChaCha20Rng::from_seed(*digest.as_bytes())
}

pub fn secure_rng() -> SecureRng {
    OsRng
}
