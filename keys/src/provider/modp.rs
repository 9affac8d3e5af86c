//! ElGamal groups: RFC 3526 MODP primes and safe prime generation.

use log::{info, warn};
use num_bigint::BigUint;
use num_bigint_dig::RandPrime;
use num_bigint_dig::prime::probably_prime;
use num_traits::{One, Zero};
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// RFC 3526 generator for every MODP group.
const GENERATOR: u32 = 2;

/// `k` offsets from RFC 3526 sections 3 to 7.
const MODP_OFFSETS: &[(usize, u64)] = &[
    (2048, 124476),
    (3072, 1690314),
    (4096, 240904),
    (6144, 929484),
    (8192, 4743158),
];

const GUARD_BITS: usize = 64;
const PRIMALITY_ROUNDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGamalGroup {
    pub p: BigUint,
    pub g: BigUint,
}

impl ElGamalGroup {
    pub fn bits(&self) -> usize {
        self.p.bits() as usize
    }
}

/// Standard MODP group for 2048, 3072, 4096, 6144 or 8192 bits.
pub fn get_parameters_by_key_size(bits: usize) -> Result<ElGamalGroup> {
    let (_, k) = MODP_OFFSETS
        .iter()
        .find(|(size, _)| *size == bits)
        .ok_or_else(|| Error::argument(format!("no standard ElGamal group of {bits} bits")))?;
    Ok(ElGamalGroup {
        p: modp_prime(bits, *k),
        g: BigUint::from(GENERATOR),
    })
}

pub fn standard_key_sizes() -> impl Iterator<Item = usize> {
    MODP_OFFSETS.iter().map(|(size, _)| *size)
}

/// `2^n - 2^(n-64) - 1 + 2^64 * (floor(2^(n-130) * pi) + k)`
fn modp_prime(n: usize, k: u64) -> BigUint {
    let one = BigUint::one();
    let middle = pi_scaled(n - 130) + BigUint::from(k);
    (&one << n) - (&one << (n - 64)) - &one + (middle << 64usize)
}

/// `floor(pi * 2^bits)` via Machin's formula `pi = 16 atan(1/5) - 4 atan(1/239)`.
fn pi_scaled(bits: usize) -> BigUint {
    let scale = BigUint::one() << (bits + GUARD_BITS);
    let pi = atan_inverse(5, &scale) * 16u32 - atan_inverse(239, &scale) * 4u32;
    pi >> GUARD_BITS
}

/// `scale * atan(1/x)` by its alternating Taylor series.
fn atan_inverse(x: u32, scale: &BigUint) -> BigUint {
    let x_squared = BigUint::from(x) * x;
    let mut power = scale / x;
    let mut positive = power.clone();
    let mut negative = BigUint::zero();
    let mut k = 1u32;
    loop {
        power /= &x_squared;
        if power.is_zero() {
            break;
        }
        let term = &power / (2 * k + 1);
        if k % 2 == 1 {
            negative += term;
        } else {
            positive += term;
        }
        k += 1;
    }
    positive - negative
}

/// Safe prime group `p = 2q + 1` with a generator of the full group.
///
/// Slow: expect minutes for 2048 bits and beyond.
pub fn generate_group(bits: usize) -> Result<ElGamalGroup> {
    if bits < 16 {
        return Err(Error::argument(format!("ElGamal group of {bits} bits is too small")));
    }
    warn!("searching for a {bits}-bit safe prime, this can take a long time");
    let mut rng = OsRng;
    let mut attempts = 0usize;
    let (p, q) = loop {
        attempts += 1;
        let q = rng.gen_prime(bits - 1);
        let p: num_bigint_dig::BigUint = (&q << 1usize) + 1u32;
        if probably_prime(&p, PRIMALITY_ROUNDS) {
            break (to_biguint(&p), to_biguint(&q));
        }
    };
    info!("found a {bits}-bit safe prime after {attempts} candidates");

    let one = BigUint::one();
    let two = BigUint::from(2u8);
    let mut g = two.clone();
    // the group order is 2q, so g generates it unless g^2 or g^q is 1
    while g.modpow(&two, &p) == one || g.modpow(&q, &p) == one {
        g += 1u32;
    }
    Ok(ElGamalGroup { p, g })
}

fn to_biguint(value: &num_bigint_dig::BigUint) -> BigUint {
    BigUint::from_bytes_be(&value.to_bytes_be())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const RFC3526_PREFIX: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1";

    #[test]
    fn test_pi_scaled() {
        // 3.14159265... * 2^32
        assert_eq!(BigUint::from(13493037704u64), pi_scaled(32));
    }

    #[rstest(bits, case(2048), case(3072), case(4096), case(6144), case(8192))]
    fn test_standard_groups(bits: usize) {
        let group = get_parameters_by_key_size(bits).unwrap();
        assert_eq!(bits, group.bits());
        assert_eq!(BigUint::from(2u8), group.g);
        let hex = group.p.to_str_radix(16).to_uppercase();
        assert!(hex.starts_with(RFC3526_PREFIX));
        assert!(hex.ends_with("FFFFFFFFFFFFFFFF"));
    }

    #[test]
    fn test_modp_2048_matches_rfc3526() {
        let group = get_parameters_by_key_size(2048).unwrap();
        let hex = group.p.to_str_radix(16).to_uppercase();
        assert!(hex.ends_with("15728E5A8AACAA68FFFFFFFFFFFFFFFF"));
        let p = num_bigint_dig::BigUint::from_bytes_be(&group.p.to_bytes_be());
        assert!(probably_prime(&p, 2));
    }

    #[rstest(bits, case(5500), case(1024), case(0))]
    fn test_unsupported_key_size(bits: usize) {
        assert!(matches!(
            get_parameters_by_key_size(bits),
            Err(Error::Argument(_))
        ));
    }

    #[test]
    fn test_generate_small_group() {
        let group = generate_group(64).unwrap();
        assert_eq!(64, group.bits());
        let q = (&group.p - 1u32) >> 1usize;
        for n in [&group.p, &q] {
            let n = num_bigint_dig::BigUint::from_bytes_be(&n.to_bytes_be());
            assert!(probably_prime(&n, 10));
        }
        assert_ne!(BigUint::one(), group.g.modpow(&q, &group.p));
    }

    #[test]
    fn test_generate_rejects_tiny_group() {
        assert!(matches!(generate_group(8), Err(Error::Argument(_))));
    }
}
