use cipherpair_core::{BigUint, BlockCipher, CipherError, QuadraticResidueCryptosystem};
use hex::encode as hex_encode;
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::PathBuf;

const FIXED_P: &str = "800000000000000000000000012347c7";
const FIXED_Q: &str = "c0000000000000000000000089abcedf";

static VECTOR_CASES: Lazy<Vec<VectorCase>> = Lazy::new(|| {
    vec![
        VectorCase::new("block_cipher", vector_block_cipher),
        VectorCase::new("quadratic_fixed_primes", vector_quadratic_fixed_primes),
    ]
});

struct VectorCase {
    name: &'static str,
    generator: fn() -> Value,
}

impl VectorCase {
    const fn new(name: &'static str, generator: fn() -> Value) -> Self {
        Self { name, generator }
    }

    fn path(&self) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("vectors")
            .join(format!("{}.json", self.name))
    }
}

#[test]
fn golden_vectors_match() {
    let update = env::var("CIPHERPAIR_UPDATE_VECTORS").map_or(false, |v| v == "1");
    for case in VECTOR_CASES.iter() {
        let actual = (case.generator)();
        let path = case.path();
        if update {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, serde_json::to_string_pretty(&actual).unwrap()).unwrap();
        }
        let expected = fs::read_to_string(&path).unwrap_or_else(|_| {
            panic!(
                "Missing golden vector '{}'. Run with CIPHERPAIR_UPDATE_VECTORS=1 cargo test golden_vectors -- --nocapture to generate.",
                case.name
            )
        });
        let expected_value: Value = serde_json::from_str(&expected).unwrap();
        if expected_value != actual {
            panic!(
                "Golden vector '{}' drifted. Expected: {}\nActual: {}",
                case.name, expected_value, actual
            );
        }
    }
}

#[test]
fn golden_ciphertexts_decrypt() {
    let block: Value = serde_json::from_str(
        &fs::read_to_string(VECTOR_CASES[0].path()).expect("block cipher vectors"),
    )
    .unwrap();
    for case in block["cases"].as_array().unwrap() {
        let key = hex::decode(case["key_hex"].as_str().unwrap()).unwrap();
        let plaintext = hex::decode(case["plaintext_hex"].as_str().unwrap()).unwrap();
        let ciphertext = hex::decode(case["ciphertext_hex"].as_str().unwrap()).unwrap();
        let cipher = BlockCipher::new(&key).unwrap();
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext);
    }

    let system = fixed_system();
    let quadratic: Value = serde_json::from_str(
        &fs::read_to_string(VECTOR_CASES[1].path()).expect("quadratic vectors"),
    )
    .unwrap();
    for case in quadratic["cases"].as_array().unwrap() {
        let message = hex::decode(case["message_hex"].as_str().unwrap()).unwrap();
        let ciphertext = hex::decode(case["ciphertext_hex"].as_str().unwrap()).unwrap();
        assert!(system.decrypt_candidates(&ciphertext).contains(&message));
        let byte_sum = message.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if byte_sum == 0 {
            // the zero checksum leaves no byte for decrypt to verify
            assert_eq!(
                system.decrypt(&ciphertext).unwrap_err(),
                CipherError::DecryptionAmbiguous
            );
        } else {
            assert_eq!(system.decrypt(&ciphertext).unwrap(), message);
        }
    }
}

fn vector_block_cipher() -> Value {
    let inputs: [(&[u8], &[u8]); 5] = [
        (b"MySecretKey123", b"Hello PTIT"),
        (b"MySecretKey123", b""),
        (
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
            b"exactly8",
        ),
        (b"k", b"Xin chao Bob! Day la tin nhan bi mat tu Alice"),
        (&[0u8; 4], &[0u8; 12]),
    ];
    let cases: Vec<_> = inputs
        .iter()
        .map(|(key, plaintext)| {
            let cipher = BlockCipher::new(key).expect("non-empty key");
            json!({
                "key_hex": hex_encode(key),
                "plaintext_hex": hex_encode(plaintext),
                "ciphertext_hex": hex_encode(cipher.encrypt(plaintext)),
            })
        })
        .collect();
    json!({
        "description": "Feistel block cipher with PKCS#7 framing",
        "cases": cases,
    })
}

fn vector_quadratic_fixed_primes() -> Value {
    let system = fixed_system();
    let messages: [&[u8]; 4] = [
        b"tin nhan bi mat",
        b"A",
        b"sealed for bob",
        &[0x01, 0xFF, 0x10, 0xF0],
    ];
    let cases: Vec<_> = messages
        .iter()
        .map(|message| {
            let ciphertext = system.encrypt(message).expect("message fits modulus");
            json!({
                "message_hex": hex_encode(message),
                "ciphertext_hex": hex_encode(ciphertext),
            })
        })
        .collect();
    json!({
        "description": "Quadratic residue ciphertexts for fixed primes",
        "p_hex": FIXED_P,
        "q_hex": FIXED_Q,
        "modulus_hex": system.public_key().modulus().to_str_radix(16),
        "cases": cases,
    })
}

fn fixed_system() -> QuadraticResidueCryptosystem {
    let p = BigUint::parse_bytes(FIXED_P.as_bytes(), 16).unwrap();
    let q = BigUint::parse_bytes(FIXED_Q.as_bytes(), 16).unwrap();
    QuadraticResidueCryptosystem::from_primes(p, q).expect("fixed primes are valid")
}
