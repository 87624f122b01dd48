//! Probabilistic primality testing and generation of primes congruent to 3 mod 4.

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

pub const DEFAULT_PRIMALITY_ROUNDS: usize = 5;

/// Miller-Rabin with `rounds` random bases. A composite passes with
/// probability at most `4^-rounds`.
pub fn is_probably_prime<R: CryptoRng + RngCore>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u8);
    if *n <= one {
        return false;
    }
    if *n <= BigUint::from(3u8) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..r {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Samples `bits`-bit primes until one passes the primality test. The top
/// bit is forced so the result has exactly `bits` bits, and the two low bits
/// are forced to `11` so the result is congruent to 3 mod 4.
pub fn generate_prime<R: CryptoRng + RngCore>(bits: u64, rounds: usize, rng: &mut R) -> BigUint {
    debug_assert!(bits >= 3, "a 3 mod 4 prime needs at least 3 bits");
    let mask = (BigUint::one() << (bits - 1)) | BigUint::from(3u8);
    loop {
        let candidate = rng.gen_biguint(bits) | &mask;
        if is_probably_prime(&candidate, rounds, rng) {
            return candidate;
        }
    }
}

/// Recursive extended Euclid: returns `(g, x, y)` with `a*x + b*y = g`.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        return (b.clone(), BigInt::zero(), BigInt::one());
    }
    let (quotient, remainder) = b.div_mod_floor(a);
    let (g, x1, y1) = extended_gcd(&remainder, a);
    (g, y1 - quotient * &x1, x1)
}
