use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use num::bigint::{BigInt, BigUint};
use num::{Integer, One, ToPrimitive, Zero};
use tracing::{debug, trace};

use crate::alphabet::{self, CIPHER_BLOCK_LEN, PLAIN_BLOCK_LEN, PLAIN_LIMIT};
use crate::arith::{self, invert_modulo};
use crate::disambiguate::{self, resolve, Candidate, Candidates, Disambiguator};
use crate::keygen::{KeyPair, ResidueClass};

// Sign assignments (a1, a2) of the roots r and s, true meaning negated
const SIGN_CASES: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

#[derive(Debug, PartialEq)]
pub enum Error {
    Alphabet(alphabet::Error),
    Arith(arith::Error),
    CiphertextLength(usize),
    CiphertextRange { block: String, value: u32 },
    Disambiguate(disambiguate::Error),
    NoValidCandidate { block: String },
    UndefinedSquareRoot {
        value: BigUint,
        prime: BigUint,
        discriminant: BigUint,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alphabet(e) => write!(f, "encoding error: {}", e),
            Error::Arith(e) => write!(f, "arithmetic error: {}", e),
            Error::CiphertextLength(len) => write!(
                f,
                "ciphertext length {} is not a multiple of {}",
                len, CIPHER_BLOCK_LEN
            ),
            Error::CiphertextRange { block, value } => write!(
                f,
                "ciphertext block {:?} has value {}, not below the modulus",
                block, value
            ),
            Error::Disambiguate(e) => write!(f, "disambiguation error: {}", e),
            Error::NoValidCandidate { block } => {
                write!(f, "no plaintext candidate for ciphertext block {:?}", block)
            }
            Error::UndefinedSquareRoot {
                value,
                prime,
                discriminant,
            } => write!(
                f,
                "no square root of {} mod {}, not a quadratic residue (discriminant {})",
                value, prime, discriminant
            ),
        }
    }
}

/// Decryption parameters
#[derive(Clone, Debug, PartialEq)]
pub struct DecryptConfig {
    /// Selections requested from the Disambiguator per block before giving up
    ///
    /// Must be at least one, decryption rejects a zero limit up front.
    pub max_selections: usize,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            max_selections: disambiguate::DEFAULT_MAX_SELECTIONS,
        }
    }
}

/// Find a square root of `a` modulo the prime `p`
///
/// p = 3 (mod 4): x = a^((p+1)/4) (mod p), valid only if x^2 = a (mod p)
///
/// p = 5 (mod 8): let d = a^((p-1)/4) (mod p)
///
///   if d = 1     => x = a^((p+3)/8) (mod p)
///   if d = p - 1 => x = 2a(4a)^((p-5)/8) (mod p)
///
/// Any other `d`, or a failed check for p = 3 (mod 4), means `a` is not a quadratic residue
/// modulo p. The error then carries d = a^((p-1)/2) for p = 3 (mod 4).
///
/// For a = 0 (mod p) the root is zero.
pub fn sqrt_mod(a: &BigUint, p: &BigUint, class: ResidueClass) -> Result<BigUint, Error> {
    let a = a % p;
    if a.is_zero() {
        return Ok(a);
    }

    match class {
        ResidueClass::ThreeModFour => {
            let r = a.modpow(&((p + 1_u8) / 4_u8), p);

            if &r * &r % p == a {
                Ok(r)
            } else {
                let d = a.modpow(&((p - 1_u8) / 2_u8), p);
                Err(Error::UndefinedSquareRoot {
                    value: a,
                    prime: p.clone(),
                    discriminant: d,
                })
            }
        }
        ResidueClass::FiveModEight => {
            let d = a.modpow(&((p - 1_u8) / 4_u8), p);

            if d.is_one() {
                Ok(a.modpow(&((p + 3_u8) / 8_u8), p))
            } else if d == p - 1_u8 {
                let four_a = &a * 4_u8;
                Ok((&a * 2_u8 * four_a.modpow(&((p - 5_u8) / 8_u8), p)) % p)
            } else {
                Err(Error::UndefinedSquareRoot {
                    value: a,
                    prime: p.clone(),
                    discriminant: d,
                })
            }
        }
    }
}

/// CRT coefficients for combining roots modulo p and q into roots modulo n
///
/// x = a1 * N1 * K1 + a2 * N2 * K2 (mod n)
///
/// with N1 = n / p, N2 = n / q, K1 = N1^(-1) mod p, K2 = N2^(-1) mod q
struct Crt {
    n: BigInt,
    n1_k1: BigInt,
    n2_k2: BigInt,
}

impl Crt {
    fn new(key: &KeyPair) -> Result<Self, Error> {
        let p = BigInt::from(key.p().clone());
        let q = BigInt::from(key.q().clone());
        let n = BigInt::from(key.n().clone());

        let n1 = &n / &p;
        let n2 = &n / &q;
        let k1 = invert_modulo(&n1, &p).map_err(|e| Error::Arith(e))?;
        let k2 = invert_modulo(&n2, &q).map_err(|e| Error::Arith(e))?;

        trace!(n1 = %n1, n2 = %n2, k1 = %k1, k2 = %k2, "CRT coefficients");

        Ok(Self {
            n1_k1: n1 * k1,
            n2_k2: n2 * k2,
            n: n,
        })
    }

    fn combine(&self, a1: &BigInt, a2: &BigInt) -> BigUint {
        let (_, x) = (a1 * &self.n1_k1 + a2 * &self.n2_k2)
            .mod_floor(&self.n)
            .into_parts();
        x
    }

    fn roots(&self, key: &KeyPair, a: &BigUint) -> Result<[BigUint; 4], Error> {
        let r = BigInt::from(sqrt_mod(a, key.p(), key.p_class())?);
        let s = BigInt::from(sqrt_mod(a, key.q(), key.q_class())?);
        debug!(a = %a, r = %r, s = %s, "square roots modulo p and q");

        let mut roots = [
            BigUint::zero(),
            BigUint::zero(),
            BigUint::zero(),
            BigUint::zero(),
        ];

        for (x, &(neg_r, neg_s)) in roots.iter_mut().zip(SIGN_CASES.iter()) {
            let a1 = if neg_r { -&r } else { r.clone() };
            let a2 = if neg_s { -&s } else { s.clone() };
            *x = self.combine(&a1, &a2);
        }

        Ok(roots)
    }

    fn candidates(&self, key: &KeyPair, block: &str) -> Result<Candidates, Error> {
        alphabet::check_block_len(block, CIPHER_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;
        let a = alphabet::encode_block(block).map_err(|e| Error::Alphabet(e))?;
        if BigUint::from(a) >= *key.n() {
            return Err(Error::CiphertextRange {
                block: block.into(),
                value: a,
            });
        }

        let roots = self.roots(key, &BigUint::from(a))?;

        let mut entries = Vec::with_capacity(roots.len());
        for (case, x) in roots.iter().enumerate() {
            // every valid plaintext value is below 27^2, anything else is another root
            let value = match x.to_u32() {
                Some(v) if v < PLAIN_LIMIT => v,
                _ => {
                    trace!(case = case + 1, x = %x, "root is not a valid plaintext value");
                    continue;
                }
            };

            let decoded =
                alphabet::decode_block(value, PLAIN_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;
            trace!(case = case + 1, x = value, block = decoded.as_str(), "valid candidate");

            entries.push(Candidate {
                case: case as u8 + 1,
                value: value,
                block: decoded,
            });
        }

        if entries.is_empty() {
            return Err(Error::NoValidCandidate {
                block: block.into(),
            });
        }

        Ok(Candidates::new(block, entries))
    }
}

/// Compute the four square roots of `a` modulo n, in sign case order
///
/// (+r, +s), (+r, -s), (-r, +s), (-r, -s) where r, s are the roots modulo p and q
pub fn roots(key: &KeyPair, a: &BigUint) -> Result<[BigUint; 4], Error> {
    Crt::new(key)?.roots(key, a)
}

/// Compute the valid plaintext candidates of a ciphertext block
///
/// errors: returns Error if the block is not CIPHER_BLOCK_LEN symbols long, its value is not
/// below n, a square root is undefined,
/// or none of the four roots is a valid plaintext block value
pub fn candidates(key: &KeyPair, block: &str) -> Result<Candidates, Error> {
    Crt::new(key)?.candidates(key, block)
}

/// Decrypt the ciphertext using the private key, with default parameters
pub fn decrypt<D>(key: &KeyPair, ciphertext: &str, disambiguator: &mut D) -> Result<String, Error>
where
    D: Disambiguator + ?Sized,
{
    decrypt_with_config(key, ciphertext, disambiguator, &DecryptConfig::default())
}

/// Decrypt the ciphertext using the private key
///
/// The ciphertext is divided into blocks of three symbols. Each block yields up to four
/// plaintext candidates, the disambiguator picks the correct one.
///
/// Padding added during encryption is kept.
///
/// errors: returns Error for invalid ciphertext or a zero `max_selections` before any block
/// is processed, and aborts on the first block that fails to decrypt
pub fn decrypt_with_config<D>(
    key: &KeyPair,
    ciphertext: &str,
    disambiguator: &mut D,
    config: &DecryptConfig,
) -> Result<String, Error>
where
    D: Disambiguator + ?Sized,
{
    if config.max_selections == 0 {
        return Err(Error::Disambiguate(disambiguate::Error::NoSelections));
    }

    let ciphertext = alphabet::normalize(ciphertext).map_err(|e| Error::Alphabet(e))?;

    let len = ciphertext.chars().count();
    if len % CIPHER_BLOCK_LEN != 0 {
        return Err(Error::CiphertextLength(len));
    }

    let blocks =
        alphabet::divide_message(&ciphertext, CIPHER_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;
    let crt = Crt::new(key)?;

    let mut plaintext = String::with_capacity(blocks.len() * PLAIN_BLOCK_LEN);
    for block in blocks.iter() {
        let candidates = crt.candidates(key, block)?;
        let chosen = resolve(&candidates, &plaintext, disambiguator, config.max_selections)
            .map_err(|e| Error::Disambiguate(e))?;

        plaintext.push_str(&chosen.block);
    }

    Ok(plaintext)
}
