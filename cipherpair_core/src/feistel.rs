//! Sixteen-round Feistel block cipher with key-dependent substitution tables.
//!
//! The structure follows Blowfish: 18 round subkeys, four 256-word tables
//! seeded from the digits of pi, and a key schedule that re-derives both by
//! encrypting with the partially built state. Messages are framed into
//! 8-byte blocks with PKCS#7 padding, so every plaintext round-trips exactly.

use log::debug;

use crate::cipher::Cipher;
use crate::error::CipherError;
use crate::pi_tables::{INITIAL_SUBKEYS, INITIAL_TABLES};

pub const BLOCK_BYTES: usize = 8;
pub const ROUNDS: usize = 16;
pub const SUBKEY_COUNT: usize = ROUNDS + 2;
const TABLE_COUNT: usize = 4;
const TABLE_WORDS: usize = 256;

#[derive(Clone)]
pub struct BlockCipher {
    round_subkeys: [u32; SUBKEY_COUNT],
    substitution_tables: [[u32; TABLE_WORDS]; TABLE_COUNT],
}

impl std::fmt::Debug for BlockCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCipher").finish_non_exhaustive()
    }
}

impl BlockCipher {
    /// Runs the key schedule for `key`. Any non-empty length is accepted;
    /// shorter keys are repeated, bytes past the 72nd are never read.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.is_empty() {
            return Err(CipherError::InvalidKey);
        }

        let mut cipher = Self {
            round_subkeys: INITIAL_SUBKEYS,
            substitution_tables: INITIAL_TABLES,
        };

        let mut key_bytes = key.iter().copied().cycle();
        for subkey in cipher.round_subkeys.iter_mut() {
            let mut word = 0u32;
            for _ in 0..4 {
                // cycle() over a non-empty slice never ends
                word = (word << 8) | u32::from(key_bytes.next().unwrap_or_default());
            }
            *subkey ^= word;
        }

        let (mut left, mut right) = (0u32, 0u32);
        for i in (0..SUBKEY_COUNT).step_by(2) {
            (left, right) = cipher.encrypt_block(left, right);
            cipher.round_subkeys[i] = left;
            cipher.round_subkeys[i + 1] = right;
        }
        for table in 0..TABLE_COUNT {
            for i in (0..TABLE_WORDS).step_by(2) {
                (left, right) = cipher.encrypt_block(left, right);
                cipher.substitution_tables[table][i] = left;
                cipher.substitution_tables[table][i + 1] = right;
            }
        }

        debug!("block cipher key schedule complete key_len={}", key.len());
        Ok(cipher)
    }

    pub fn round_subkeys(&self) -> &[u32; SUBKEY_COUNT] {
        &self.round_subkeys
    }

    pub fn substitution_tables(&self) -> &[[u32; TABLE_WORDS]; TABLE_COUNT] {
        &self.substitution_tables
    }

    fn mix(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        let tables = &self.substitution_tables;
        (tables[0][a as usize].wrapping_add(tables[1][b as usize]) ^ tables[2][c as usize])
            .wrapping_add(tables[3][d as usize])
    }

    /// Encrypts one 64-bit block given as its big-endian halves.
    pub fn encrypt_block(&self, mut left: u32, mut right: u32) -> (u32, u32) {
        for subkey in &self.round_subkeys[..ROUNDS] {
            left ^= subkey;
            right ^= self.mix(left);
            (left, right) = (right, left);
        }
        (left, right) = (right, left);
        right ^= self.round_subkeys[ROUNDS];
        left ^= self.round_subkeys[ROUNDS + 1];
        (left, right)
    }

    pub fn decrypt_block(&self, mut left: u32, mut right: u32) -> (u32, u32) {
        for subkey in self.round_subkeys[2..].iter().rev() {
            left ^= subkey;
            right ^= self.mix(left);
            (left, right) = (right, left);
        }
        (left, right) = (right, left);
        right ^= self.round_subkeys[1];
        left ^= self.round_subkeys[0];
        (left, right)
    }

    /// Pads `plaintext` to a whole number of blocks and encrypts it. The
    /// output is always `(plaintext.len() / 8 + 1) * 8` bytes long.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let pad_len = BLOCK_BYTES - plaintext.len() % BLOCK_BYTES;
        let mut buffer = Vec::with_capacity(plaintext.len() + pad_len);
        buffer.extend_from_slice(plaintext);
        buffer.resize(plaintext.len() + pad_len, pad_len as u8);

        for block in buffer.chunks_exact_mut(BLOCK_BYTES) {
            self.transform_in_place(block, Self::encrypt_block);
        }
        debug!(
            "block cipher encrypt plaintext_len={} blocks={}",
            plaintext.len(),
            buffer.len() / BLOCK_BYTES
        );
        buffer
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_BYTES != 0 {
            return Err(CipherError::InvalidCiphertextLength {
                len: ciphertext.len(),
            });
        }

        let mut buffer = ciphertext.to_vec();
        for block in buffer.chunks_exact_mut(BLOCK_BYTES) {
            self.transform_in_place(block, Self::decrypt_block);
        }

        let pad_len = buffer[buffer.len() - 1] as usize;
        if pad_len == 0 || pad_len > BLOCK_BYTES {
            return Err(CipherError::InvalidPadding);
        }
        let body_len = buffer.len() - pad_len;
        if buffer[body_len..].iter().any(|&byte| byte as usize != pad_len) {
            return Err(CipherError::InvalidPadding);
        }
        buffer.truncate(body_len);
        debug!(
            "block cipher decrypt blocks={} plaintext_len={}",
            ciphertext.len() / BLOCK_BYTES,
            buffer.len()
        );
        Ok(buffer)
    }

    fn transform_in_place(&self, block: &mut [u8], op: fn(&Self, u32, u32) -> (u32, u32)) {
        let left = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let right = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let (left, right) = op(self, left, right);
        block[..4].copy_from_slice(&left.to_be_bytes());
        block[4..].copy_from_slice(&right.to_be_bytes());
    }
}

impl Cipher for BlockCipher {
    fn name(&self) -> &'static str {
        "blowfish"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        Ok(BlockCipher::encrypt(self, plaintext))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        BlockCipher::decrypt(self, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;
    use proptest::prelude::*;
    use rand::Rng;

    fn block(hex_block: u64) -> (u32, u32) {
        ((hex_block >> 32) as u32, hex_block as u32)
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(BlockCipher::new(b"").unwrap_err(), CipherError::InvalidKey);
    }

    #[test]
    fn reference_block_vectors() {
        let cases: [([u8; 8], u64, u64); 4] = [
            ([0x00; 8], 0x0000000000000000, 0x4EF997456198DD78),
            ([0xFF; 8], 0xFFFFFFFFFFFFFFFF, 0x51866FD5B85ECB8A),
            (
                [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF],
                0x1111111111111111,
                0x61F9C3802281B096,
            ),
            (
                [0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32, 0x10],
                0x0123456789ABCDEF,
                0x0ACEAB0FC6A0A28D,
            ),
        ];
        for (key, plain, expected) in cases {
            let cipher = BlockCipher::new(&key).unwrap();
            let (l, r) = block(plain);
            assert_eq!(cipher.encrypt_block(l, r), block(expected));
            let (el, er) = block(expected);
            assert_eq!(cipher.decrypt_block(el, er), block(plain));
        }
    }

    #[test]
    fn key_schedule_is_deterministic() {
        let a = BlockCipher::new(b"MySecretKey123").unwrap();
        let b = BlockCipher::new(b"MySecretKey123").unwrap();
        let c = BlockCipher::new(b"MySecretKey124").unwrap();
        assert_eq!(a.round_subkeys(), b.round_subkeys());
        assert_eq!(a.substitution_tables(), b.substitution_tables());
        assert_ne!(a.round_subkeys(), c.round_subkeys());
        assert_ne!(a.round_subkeys(), &INITIAL_SUBKEYS);
        assert_ne!(a.substitution_tables(), &INITIAL_TABLES);
    }

    #[test]
    fn short_keys_wrap_cyclically() {
        let short = BlockCipher::new(b"ab").unwrap();
        let repeated = BlockCipher::new(&b"ab".repeat(36)).unwrap();
        assert_eq!(short.round_subkeys(), repeated.round_subkeys());

        let long = BlockCipher::new(&[b"ab".repeat(36), b"ignored".to_vec()].concat()).unwrap();
        assert_eq!(short.round_subkeys(), long.round_subkeys());
    }

    #[test]
    fn ciphertext_length_always_adds_padding() {
        let cipher = BlockCipher::new(b"length-key").unwrap();
        for len in 0..=24 {
            let ciphertext = cipher.encrypt(&vec![0xAB; len]);
            assert_eq!(ciphertext.len(), (len + 1).div_ceil(BLOCK_BYTES) * BLOCK_BYTES);
        }
    }

    #[test]
    fn trailing_zero_bytes_survive() {
        let cipher = BlockCipher::new(b"zero-tail").unwrap();
        for message in [
            b"Hello PTIT\0\0".to_vec(),
            vec![0u8; 8],
            vec![0u8; 1],
            Vec::new(),
        ] {
            let ciphertext = cipher.encrypt(&message);
            assert_eq!(cipher.decrypt(&ciphertext).unwrap(), message);
        }
    }

    #[test]
    fn identical_blocks_encrypt_identically() {
        let cipher = BlockCipher::new(b"ecb-key").unwrap();
        let ciphertext = cipher.encrypt(&[0x42; 16]);
        assert_eq!(ciphertext[..8], ciphertext[8..16]);
        assert_ne!(ciphertext[..8], ciphertext[16..24]);
    }

    #[test]
    fn malformed_ciphertext_lengths_rejected() {
        let cipher = BlockCipher::new(b"length").unwrap();
        for len in [0usize, 1, 7, 9, 15] {
            assert_eq!(
                cipher.decrypt(&vec![0u8; len]).unwrap_err(),
                CipherError::InvalidCiphertextLength { len }
            );
        }
    }

    #[test]
    fn corrupted_padding_rejected() {
        let cipher = BlockCipher::new(b"padding-key").unwrap();
        for trailer in [[0u8; 8], [9u8; 8], [1, 2, 3, 4, 5, 6, 7, 3]] {
            let (l, r) = cipher.encrypt_block(
                u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]),
                u32::from_be_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]),
            );
            let mut ciphertext = l.to_be_bytes().to_vec();
            ciphertext.extend_from_slice(&r.to_be_bytes());
            assert_eq!(
                cipher.decrypt(&ciphertext).unwrap_err(),
                CipherError::InvalidPadding
            );
        }
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let sender = BlockCipher::new(b"right key").unwrap();
        let other = BlockCipher::new(b"wrong key").unwrap();
        let ciphertext = sender.encrypt(b"Xin chao Bob! Day la tin nhan bi mat");
        match other.decrypt(&ciphertext) {
            Ok(plaintext) => assert_ne!(plaintext, b"Xin chao Bob! Day la tin nhan bi mat"),
            Err(err) => assert_eq!(err, CipherError::InvalidPadding),
        }
    }

    #[test]
    fn single_bit_flip_avalanches() {
        let mut rng = seeded_rng(b"avalanche");
        let trials = 512;
        let mut total_changed = 0u32;
        for _ in 0..trials {
            let key_len = rng.gen_range(1..=56);
            let key: Vec<u8> = (0..key_len).map(|_| rng.gen_range(0..=255u8)).collect();
            let cipher = BlockCipher::new(&key).unwrap();
            let plain: u64 = rng.gen_range(0..=u64::MAX);
            let bit = rng.gen_range(0..64);
            let (l0, r0) = cipher.encrypt_block((plain >> 32) as u32, plain as u32);
            let flipped = plain ^ (1u64 << bit);
            let (l1, r1) = cipher.encrypt_block((flipped >> 32) as u32, flipped as u32);
            total_changed += (l0 ^ l1).count_ones() + (r0 ^ r1).count_ones();
        }
        let mean = f64::from(total_changed) / f64::from(trials);
        assert!(
            (30.0..=34.0).contains(&mean),
            "mean changed bits {mean} away from 32"
        );
    }

    proptest! {
        #[test]
        fn roundtrip_any_key_any_message(
            key in prop::collection::vec(any::<u8>(), 1..80),
            message in prop::collection::vec(any::<u8>(), 0..200),
        ) {
            let cipher = BlockCipher::new(&key).unwrap();
            let ciphertext = cipher.encrypt(&message);
            prop_assert_eq!(ciphertext.len() % BLOCK_BYTES, 0);
            prop_assert_eq!(cipher.decrypt(&ciphertext).unwrap(), message);
        }

        #[test]
        fn block_permutation_inverts(key in prop::collection::vec(any::<u8>(), 1..16), l: u32, r: u32) {
            let cipher = BlockCipher::new(&key).unwrap();
            let (el, er) = cipher.encrypt_block(l, r);
            prop_assert_eq!(cipher.decrypt_block(el, er), (l, r));
        }
    }
}
