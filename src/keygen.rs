use core::fmt;

use num::bigint::BigUint;
use rand::Rng;
use tracing::{debug, trace};

use crate::alphabet::{CIPHER_LIMIT, PLAIN_LIMIT};
use crate::arith::{self, get_prime, is_prime, residue};

/// Default interval for the random prime search, gives primes up to 161
pub const DEFAULT_INTERVAL: (u64, u64) = (10, 80);

/// Default number of prime draws before key generation gives up
pub const DEFAULT_MAX_ATTEMPTS: usize = 4096;

#[derive(Debug, PartialEq)]
pub enum Error {
    Arith(arith::Error),
    AttemptsExhausted(usize),
    EqualPrimes(BigUint),
    ModulusRange(BigUint),
    NotPrime(BigUint),
    UnsupportedResidue(BigUint),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Arith(e) => write!(f, "arithmetic error: {}", e),
            Error::AttemptsExhausted(n) => write!(f, "no valid key pair after {} prime draws", n),
            Error::EqualPrimes(p) => write!(f, "p and q must differ, both are {}", p),
            Error::ModulusRange(n) => write!(
                f,
                "modulus {} is outside [{}, {}]",
                n, PLAIN_LIMIT, CIPHER_LIMIT
            ),
            Error::NotPrime(x) => write!(f, "{} is not prime", x),
            Error::UnsupportedResidue(p) => {
                write!(f, "{} is neither 3 mod 4 nor 5 mod 8", p)
            }
        }
    }
}

/// Residue class of a prime, selects the square root formula
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResidueClass {
    /// p = 3 (mod 4)
    ThreeModFour,
    /// p = 5 (mod 8)
    FiveModEight,
}

impl ResidueClass {
    /// Classify a prime
    ///
    /// errors: returns Error for p = 1 (mod 8), and even numbers
    pub fn of(p: &BigUint) -> Result<Self, Error> {
        if residue(p, 4) == BigUint::from(3_u8) {
            Ok(ResidueClass::ThreeModFour)
        } else if residue(p, 8) == BigUint::from(5_u8) {
            Ok(ResidueClass::FiveModEight)
        } else {
            Err(Error::UnsupportedResidue(p.clone()))
        }
    }
}

/// Key generation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct KeyConfig {
    /// Interval k is drawn from for the 2k + 1 prime search start
    pub interval: (u64, u64),
    /// Maximum number of prime draws across both primes
    pub max_attempts: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Rabin public key: the modulus n = p * q
#[derive(Clone, Debug, PartialEq)]
pub struct PublicKey {
    n: BigUint,
}

impl PublicKey {
    /// Create a public key from a modulus
    ///
    /// errors: returns Error if the modulus is outside [27^2, 27^3]
    pub fn new(n: BigUint) -> Result<Self, Error> {
        if !modulus_in_range(&n) {
            return Err(Error::ModulusRange(n));
        }
        Ok(Self { n: n })
    }

    /// Get the modulus
    pub fn n(&self) -> &BigUint {
        &self.n
    }
}

/// Rabin key pair
///
/// Public key: n
/// Private key: (p, q)
#[derive(Clone, Debug, PartialEq)]
pub struct KeyPair {
    p: BigUint,
    q: BigUint,
    p_class: ResidueClass,
    q_class: ResidueClass,
    public: PublicKey,
}

impl KeyPair {
    /// Create a key pair from two known primes
    ///
    /// errors: returns Error if either number is not prime, has an unsupported residue class,
    /// the primes are equal, or n = p * q does not fit the block encoding
    pub fn new(p: BigUint, q: BigUint) -> Result<Self, Error> {
        if !is_prime(&p) {
            return Err(Error::NotPrime(p));
        }

        if !is_prime(&q) {
            return Err(Error::NotPrime(q));
        }

        if p == q {
            return Err(Error::EqualPrimes(p));
        }

        let p_class = ResidueClass::of(&p)?;
        let q_class = ResidueClass::of(&q)?;
        let public = PublicKey::new(&p * &q)?;

        Ok(Self {
            p: p,
            q: q,
            p_class: p_class,
            q_class: q_class,
            public: public,
        })
    }

    /// Generate a random key pair
    ///
    /// Primes equal to 1 (mod 8) are redrawn, as are second primes equal to the first,
    /// or giving a modulus outside [27^2, 27^3]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &KeyConfig) -> Result<Self, Error> {
        let mut attempts = 0_usize;

        let p = draw_prime(rng, config, &mut attempts, |p| ResidueClass::of(p).is_ok())?;
        let q = draw_prime(rng, config, &mut attempts, |q| {
            *q != p && ResidueClass::of(q).is_ok() && modulus_in_range(&(&p * q))
        })?;

        let key = Self::new(p, q)?;
        debug!(p = %key.p, q = %key.q, n = %key.public.n, attempts, "generated key pair");

        Ok(key)
    }

    /// Get the first private prime
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// Get the second private prime
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Get the public modulus
    pub fn n(&self) -> &BigUint {
        &self.public.n
    }

    /// Get the residue class of p
    pub fn p_class(&self) -> ResidueClass {
        self.p_class
    }

    /// Get the residue class of q
    pub fn q_class(&self) -> ResidueClass {
        self.q_class
    }

    /// Get the public half of the key pair
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p= {}; q= {}; n= {}", self.p, self.q, self.public.n)
    }
}

// Every plaintext value must be below n, and every ciphertext value must fit three symbols
fn modulus_in_range(n: &BigUint) -> bool {
    *n >= BigUint::from(PLAIN_LIMIT) && *n <= BigUint::from(CIPHER_LIMIT)
}

fn draw_prime<R, F>(
    rng: &mut R,
    config: &KeyConfig,
    attempts: &mut usize,
    accept: F,
) -> Result<BigUint, Error>
where
    R: Rng + ?Sized,
    F: Fn(&BigUint) -> bool,
{
    while *attempts < config.max_attempts {
        *attempts += 1;

        let prime = get_prime(rng, config.interval).map_err(|e| Error::Arith(e))?;
        if accept(&prime) {
            return Ok(prime);
        }
        trace!(prime = %prime, "rejected prime");
    }

    Err(Error::AttemptsExhausted(config.max_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::format;
    use rand::thread_rng;

    fn big(x: u32) -> BigUint {
        BigUint::from(x)
    }

    #[test]
    fn check_residue_class() {
        assert_eq!(ResidueClass::of(&big(23)), Ok(ResidueClass::ThreeModFour));
        assert_eq!(ResidueClass::of(&big(31)), Ok(ResidueClass::ThreeModFour));
        assert_eq!(ResidueClass::of(&big(37)), Ok(ResidueClass::FiveModEight));
        assert_eq!(ResidueClass::of(&big(53)), Ok(ResidueClass::FiveModEight));
        assert_eq!(
            ResidueClass::of(&big(41)),
            Err(Error::UnsupportedResidue(big(41)))
        );
        assert_eq!(
            ResidueClass::of(&big(17)),
            Err(Error::UnsupportedResidue(big(17)))
        );
    }

    #[test]
    fn check_key_pair_new() {
        let key = KeyPair::new(big(23), big(37)).unwrap();
        assert_eq!(key.n(), &big(851));
        assert_eq!(key.p_class(), ResidueClass::ThreeModFour);
        assert_eq!(key.q_class(), ResidueClass::FiveModEight);
        assert_eq!(key.public_key().n(), &big(851));
        assert_eq!(format!("{}", key), "p= 23; q= 37; n= 851");

        assert_eq!(KeyPair::new(big(21), big(37)), Err(Error::NotPrime(big(21))));
        assert_eq!(KeyPair::new(big(23), big(39)), Err(Error::NotPrime(big(39))));
        assert_eq!(KeyPair::new(big(43), big(43)), Err(Error::EqualPrimes(big(43))));
        assert_eq!(
            KeyPair::new(big(41), big(43)),
            Err(Error::UnsupportedResidue(big(41)))
        );
        // 23 * 31 = 713 < 27^2
        assert_eq!(KeyPair::new(big(23), big(31)), Err(Error::ModulusRange(big(713))));
        // 151 * 157 = 23707 > 27^3
        assert_eq!(
            KeyPair::new(big(151), big(157)),
            Err(Error::ModulusRange(big(23707)))
        );
    }

    #[test]
    fn check_generate() {
        let mut rng = thread_rng();
        let config = KeyConfig::default();

        for _i in 0..32 {
            let key = KeyPair::generate(&mut rng, &config).unwrap();
            assert_ne!(key.p(), key.q());
            assert_eq!(key.p() * key.q(), *key.n());
            assert!(ResidueClass::of(key.p()).is_ok());
            assert!(ResidueClass::of(key.q()).is_ok());
            assert!(modulus_in_range(key.n()));
        }
    }

    #[test]
    fn check_generate_exhausted() {
        let mut rng = thread_rng();

        // only ever draws 3, so q can never differ from p
        let config = KeyConfig {
            interval: (1, 1),
            max_attempts: 8,
        };
        assert_eq!(
            KeyPair::generate(&mut rng, &config),
            Err(Error::AttemptsExhausted(8))
        );

        let config = KeyConfig {
            interval: (0, 1),
            max_attempts: 8,
        };
        assert_eq!(
            KeyPair::generate(&mut rng, &config),
            Err(Error::Arith(arith::Error::InvalidInterval(0, 1)))
        );
    }
}
