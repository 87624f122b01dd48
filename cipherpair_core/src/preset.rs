use crate::primes::DEFAULT_PRIMALITY_ROUNDS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityLevel {
    Toy,
    Standard,
    Paranoid,
}

/// Parameter set shared by the simulation scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecurityPreset {
    pub level: SecurityLevel,
    /// Modulus size for the quadratic-residue cryptosystem.
    pub key_size_bits: u64,
    /// Miller-Rabin bases tried per prime candidate.
    pub primality_rounds: usize,
    /// Length of randomly generated block cipher keys.
    pub session_key_bytes: usize,
}

pub fn security_preset(level: SecurityLevel) -> SecurityPreset {
    match level {
        SecurityLevel::Toy => SecurityPreset {
            level,
            key_size_bits: 256,
            primality_rounds: DEFAULT_PRIMALITY_ROUNDS,
            session_key_bytes: 8,
        },
        SecurityLevel::Standard => SecurityPreset {
            level,
            key_size_bits: 512,
            primality_rounds: DEFAULT_PRIMALITY_ROUNDS,
            session_key_bytes: 16,
        },
        SecurityLevel::Paranoid => SecurityPreset {
            level,
            key_size_bits: 1024,
            primality_rounds: 20,
            session_key_bytes: 56,
        },
    }
}

impl SecurityPreset {
    pub fn with_key_size(mut self, bits: u64) -> Self {
        self.key_size_bits = bits;
        self
    }

    pub fn with_primality_rounds(mut self, rounds: usize) -> Self {
        self.primality_rounds = rounds;
        self
    }

    /// Largest message the quadratic cryptosystem accepts under this preset
    /// without depending on the exact modulus value.
    pub fn max_wrapped_message_bytes(&self) -> usize {
        ((self.key_size_bits / 8) as usize).saturating_sub(2)
    }
}
