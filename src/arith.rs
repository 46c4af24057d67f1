use core::fmt;

use num::bigint::{BigInt, BigUint};
use num::{Integer, One, Signed, Zero};
use rand::Rng;

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidInterval(u64, u64),
    InvalidModulus(BigInt),
    NotInvertible(BigInt, BigInt),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInterval(lo, hi) => write!(f, "invalid prime interval [{}, {}]", lo, hi),
            Error::InvalidModulus(n) => write!(f, "modulus must be positive, got {}", n),
            Error::NotInvertible(a, n) => write!(f, "{} has no inverse modulo {}", a, n),
        }
    }
}

/// Check if a number is prime using trial division by odd numbers up to sqrt(x)
pub fn is_prime(x: &BigUint) -> bool {
    let two = BigUint::from(2_u8);

    if *x < two {
        return false;
    }

    if *x == two {
        return true;
    }

    if x.is_even() {
        return false;
    }

    let mut i = BigUint::from(3_u8);
    while &i * &i <= *x {
        if (x % &i).is_zero() {
            return false;
        }
        i += 2_u8;
    }

    true
}

/// Extended Euclidean algorithm
///
/// Finds integer coefficients (x, y) such that: ax + by = gcd(a, b)
///
/// Example:
///
/// extended_euclid(10, 6) == (-1, 2)
/// extended_euclid(7, 5) == (-2, 3)
pub fn extended_euclid(a: &BigInt, b: &BigInt) -> (BigInt, BigInt) {
    if b.is_zero() {
        return (BigInt::one(), BigInt::zero());
    }

    let (x, y) = extended_euclid(b, &a.mod_floor(b));
    let k = a.div_floor(b);
    let ky = &k * &y;

    (y, x - ky)
}

/// Find the inverse of `a` modulo `n`, i.e. a^(-1) mod n
///
/// The result is normalized into [0, n)
///
/// errors: returns Error for non-positive moduli, and when gcd(a, n) != 1
pub fn invert_modulo(a: &BigInt, n: &BigInt) -> Result<BigInt, Error> {
    if !n.is_positive() {
        return Err(Error::InvalidModulus(n.clone()));
    }

    if !a.gcd(n).is_one() {
        return Err(Error::NotInvertible(a.clone(), n.clone()));
    }

    let (x, _) = extended_euclid(a, n);

    Ok(x.mod_floor(n))
}

/// Generate a prime number from a random starting point in the interval
///
/// Draws k uniformly from [lo, hi] (inclusive), and searches downward from 2k + 1
/// in steps of two until a prime is found.
///
/// The resulting primes are not uniformly distributed, this is toy crypto anyway
///
/// errors: returns Error if the interval is empty or starts at zero
pub fn get_prime<R: Rng + ?Sized>(rng: &mut R, interval: (u64, u64)) -> Result<BigUint, Error> {
    let (lo, hi) = interval;

    // lo >= 1 means the search stops at three at the latest
    if lo == 0 || lo > hi {
        return Err(Error::InvalidInterval(lo, hi));
    }

    let hi_exclusive = hi.checked_add(1).ok_or(Error::InvalidInterval(lo, hi))?;
    let start = rng.gen_range::<u64, u64, u64>(lo, hi_exclusive);

    let mut candidate = BigUint::from(start) * 2_u8 + 1_u8;
    while !is_prime(&candidate) {
        candidate -= 2_u8;
    }

    Ok(candidate)
}

/// Get the residue of `x` modulo a small modulus
pub(crate) fn residue(x: &BigUint, m: u32) -> BigUint {
    x % m
}
