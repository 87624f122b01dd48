//! Rabin-style public-key encryption by modular squaring.
//!
//! A message is prefixed with a one-byte checksum (byte sum mod 256), read
//! as a big-endian integer `m`, and encrypted as `m^2 mod n` with
//! `n = p * q`. Because p and q are both 3 mod 4, the private key holder
//! can take square roots mod p and mod q with a single exponentiation each,
//! then recombine them via CRT into four candidate roots mod n. The
//! checksum picks which candidate was the message.
//!
//! The checksum is one byte, so a wrong root matches by chance with
//! probability about 1/256. Decryption returns the first consistent root in
//! a fixed order and does not try to detect that case. When no root is
//! consistent it fails rather than guessing.
//! [`QuadraticResidueCryptosystem::decrypt_candidates`] lists every reading,
//! including messages whose zero checksum vanished from the encoding.

use blake3::Hasher;
use log::debug;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::Zero;
use rand_core::{CryptoRng, RngCore};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cipher::Cipher;
use crate::error::CipherError;
use crate::primes::{DEFAULT_PRIMALITY_ROUNDS, extended_gcd, generate_prime, is_probably_prime};
use crate::rng::secure_rng;
use crate::versioning::{
    QUADRATIC_PRIVATE_KEY_VERSION, QUADRATIC_PUBLIC_KEY_VERSION, expect_version,
};

pub const MIN_KEY_SIZE_BITS: u64 = 16;
const VALIDATION_ROUNDS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuadraticPublicKey {
    modulus: BigUint,
}

#[derive(Clone, PartialEq, Eq)]
pub struct QuadraticPrivateKey {
    p: BigUint,
    q: BigUint,
}

impl std::fmt::Debug for QuadraticPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadraticPrivateKey")
            .field("p_bits", &self.p.bits())
            .field("q_bits", &self.q.bits())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuadraticResidueCryptosystem {
    public: QuadraticPublicKey,
    private: QuadraticPrivateKey,
}

impl QuadraticPublicKey {
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Byte length of the modulus; encoded messages must be strictly below it.
    pub fn modulus_len(&self) -> usize {
        minimal_bytes(&self.modulus).len()
    }

    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(b"cipherpair::quadratic-public-key");
        hasher.update(&minimal_bytes(&self.modulus));
        *hasher.finalize().as_bytes()
    }

    /// Squares an already encoded message. Fails when `m >= modulus`.
    pub fn encrypt_integer(&self, m: &BigUint) -> Result<BigUint, CipherError> {
        if *m >= self.modulus {
            return Err(CipherError::MessageTooLarge);
        }
        Ok(m.modpow(&BigUint::from(2u8), &self.modulus))
    }

    pub fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut encoded = Vec::with_capacity(message.len() + 1);
        encoded.push(checksum(message));
        encoded.extend_from_slice(message);
        let m = BigUint::from_bytes_be(&encoded);
        let c = self.encrypt_integer(&m)?;
        let ciphertext = minimal_bytes(&c);
        debug!(
            "quadratic encrypt message_len={} modulus_bits={} ciphertext_len={}",
            message.len(),
            self.modulus.bits(),
            ciphertext.len()
        );
        Ok(ciphertext)
    }
}

impl QuadraticPrivateKey {
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    fn validate(
        p: BigUint,
        q: BigUint,
        rng: &mut (impl CryptoRng + RngCore),
    ) -> Result<Self, CipherError> {
        for factor in [&p, &q] {
            if factor % 4u8 != BigUint::from(3u8) {
                return Err(CipherError::InvalidPrimeFactor("factor is not 3 mod 4"));
            }
            if !is_probably_prime(factor, VALIDATION_ROUNDS, rng) {
                return Err(CipherError::InvalidPrimeFactor("factor is not prime"));
            }
        }
        if p == q {
            return Err(CipherError::InvalidPrimeFactor("factors must be distinct"));
        }
        Ok(Self { p, q })
    }
}

impl QuadraticResidueCryptosystem {
    /// Generates a fresh key pair with `key_size_bits / 2`-bit primes from the OS RNG.
    pub fn new(key_size_bits: u64) -> Result<Self, CipherError> {
        let mut rng = secure_rng();
        Self::with_rng(key_size_bits, DEFAULT_PRIMALITY_ROUNDS, &mut rng)
    }

    pub fn with_rng<R: CryptoRng + RngCore>(
        key_size_bits: u64,
        primality_rounds: usize,
        rng: &mut R,
    ) -> Result<Self, CipherError> {
        if key_size_bits < MIN_KEY_SIZE_BITS || key_size_bits % 2 != 0 {
            return Err(CipherError::InvalidKeySize {
                bits: key_size_bits,
            });
        }
        let prime_bits = key_size_bits / 2;
        let p = generate_prime(prime_bits, primality_rounds, rng);
        let mut q = generate_prime(prime_bits, primality_rounds, rng);
        while q == p {
            q = generate_prime(prime_bits, primality_rounds, rng);
        }
        let system = Self::from_private_key(QuadraticPrivateKey { p, q });
        debug!(
            "quadratic keygen key_size={} modulus_bits={} rounds={}",
            key_size_bits,
            system.public.modulus.bits(),
            primality_rounds
        );
        Ok(system)
    }

    /// Builds a key pair from caller-chosen primes after validating them.
    pub fn from_primes(p: BigUint, q: BigUint) -> Result<Self, CipherError> {
        let mut rng = secure_rng();
        let private = QuadraticPrivateKey::validate(p, q, &mut rng)?;
        Ok(Self::from_private_key(private))
    }

    pub fn from_private_key(private: QuadraticPrivateKey) -> Self {
        let modulus = &private.p * &private.q;
        Self {
            public: QuadraticPublicKey { modulus },
            private,
        }
    }

    pub fn public_key(&self) -> &QuadraticPublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &QuadraticPrivateKey {
        &self.private
    }

    pub fn encrypt_integer(&self, m: &BigUint) -> Result<BigUint, CipherError> {
        self.public.encrypt_integer(m)
    }

    pub fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.public.encrypt(message)
    }

    /// The four square roots of `c` modulo `n`, in the order decryption tries them.
    pub fn square_roots(&self, c: &BigUint) -> [BigUint; 4] {
        let QuadraticPrivateKey { p, q } = &self.private;
        let n = &self.public.modulus;

        let mp = c.modpow(&((p + 1u8) >> 2), p);
        let mq = c.modpow(&((q + 1u8) >> 2), q);

        let (p_signed, q_signed) = (BigInt::from(p.clone()), BigInt::from(q.clone()));
        let n_signed = BigInt::from(n.clone());
        let (_, yp, yq) = extended_gcd(&p_signed, &q_signed);

        let u = reduce(yp * &p_signed * BigInt::from(mq), &n_signed);
        let v = reduce(yq * &q_signed * BigInt::from(mp), &n_signed);

        let r1 = (&u + &v) % n;
        let r2 = (&u + n - &v) % n;
        let r3 = (n - &r1) % n;
        let r4 = (n - &r2) % n;
        [r1, r2, r3, r4]
    }

    /// Every plaintext consistent with `ciphertext`, in preference order.
    /// Checksum-verified readings come first, then whole roots whose byte sum
    /// is zero, which is how a message with a zero checksum decodes.
    /// [`decrypt`](Self::decrypt) only ever returns the first kind.
    pub fn decrypt_candidates(&self, ciphertext: &[u8]) -> Vec<Vec<u8>> {
        let roots = self.square_roots(&BigUint::from_bytes_be(ciphertext));
        let primary = roots.iter().filter_map(primary_decoding);
        let fallback = roots.iter().filter_map(implied_zero_decoding);
        primary.chain(fallback).collect()
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let roots = self.square_roots(&BigUint::from_bytes_be(ciphertext));
        let message = roots
            .iter()
            .find_map(primary_decoding)
            .ok_or(CipherError::DecryptionAmbiguous)?;
        debug!(
            "quadratic decrypt ciphertext_len={} message_len={}",
            ciphertext.len(),
            message.len()
        );
        Ok(message)
    }
}

impl Cipher for QuadraticResidueCryptosystem {
    fn name(&self) -> &'static str {
        "rabin"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        QuadraticResidueCryptosystem::encrypt(self, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        QuadraticResidueCryptosystem::decrypt(self, ciphertext)
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte))
}

/// Big-endian bytes without leading zeros; zero encodes as the empty string.
fn minimal_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

fn reduce(value: BigInt, modulus: &BigInt) -> BigUint {
    value.mod_floor(modulus).into_parts().1
}

/// Reads `root` as `checksum || message`.
fn primary_decoding(root: &BigUint) -> Option<Vec<u8>> {
    let bytes = minimal_bytes(root);
    if bytes.len() < 2 {
        return None;
    }
    let (claimed, message) = bytes.split_first()?;
    (checksum(message) == *claimed).then(|| message.to_vec())
}

/// A zero checksum vanishes from the integer encoding, so the whole root is
/// the message. Only offered as a candidate, never by `decrypt`.
fn implied_zero_decoding(root: &BigUint) -> Option<Vec<u8>> {
    let bytes = minimal_bytes(root);
    (!bytes.is_empty() && checksum(&bytes) == 0).then_some(bytes)
}

fn biguint_to_hex(value: &BigUint) -> String {
    hex::encode(minimal_bytes(value))
}

fn biguint_from_hex<E: serde::de::Error>(text: &str, field: &'static str) -> Result<BigUint, E> {
    let bytes =
        hex::decode(text).map_err(|err| E::custom(format!("{field} is not valid hex: {err}")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

impl Serialize for QuadraticPublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("QuadraticPublicKey", 2)?;
        state.serialize_field("version", &QUADRATIC_PUBLIC_KEY_VERSION)?;
        state.serialize_field("modulus", &biguint_to_hex(&self.modulus))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for QuadraticPublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            version: u16,
            modulus: String,
        }
        let helper = Helper::deserialize(deserializer)?;
        expect_version::<D::Error>(
            helper.version,
            QUADRATIC_PUBLIC_KEY_VERSION,
            "QuadraticPublicKey",
        )?;
        let modulus = biguint_from_hex::<D::Error>(&helper.modulus, "modulus")?;
        if modulus.bits() < MIN_KEY_SIZE_BITS - 1 {
            return Err(serde::de::Error::custom("modulus is too small"));
        }
        Ok(Self { modulus })
    }
}

impl Serialize for QuadraticPrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("QuadraticPrivateKey", 3)?;
        state.serialize_field("version", &QUADRATIC_PRIVATE_KEY_VERSION)?;
        state.serialize_field("p", &biguint_to_hex(&self.p))?;
        state.serialize_field("q", &biguint_to_hex(&self.q))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for QuadraticPrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            version: u16,
            p: String,
            q: String,
        }
        let helper = Helper::deserialize(deserializer)?;
        expect_version::<D::Error>(
            helper.version,
            QUADRATIC_PRIVATE_KEY_VERSION,
            "QuadraticPrivateKey",
        )?;
        let p = biguint_from_hex::<D::Error>(&helper.p, "p")?;
        let q = biguint_from_hex::<D::Error>(&helper.q, "q")?;
        let mut rng = secure_rng();
        QuadraticPrivateKey::validate(p, q, &mut rng).map_err(serde::de::Error::custom)
    }
}
