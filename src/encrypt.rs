use alloc::string::String;
use core::fmt;

use num::bigint::BigUint;
use num::ToPrimitive;
use tracing::debug;

use crate::alphabet::{self, CIPHER_BLOCK_LEN, PLAIN_BLOCK_LEN};
use crate::keygen::PublicKey;

#[derive(Debug, PartialEq)]
pub enum Error {
    Alphabet(alphabet::Error),
    CiphertextRange(BigUint),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alphabet(e) => write!(f, "encoding error: {}", e),
            Error::CiphertextRange(c) => {
                write!(f, "ciphertext value {} does not fit a block", c)
            }
        }
    }
}

/// Encrypt the numeric value of a plaintext block: c = m^2 mod n
pub fn encrypt_value(key: &PublicKey, m: u32) -> Result<u32, Error> {
    let c = BigUint::from(m).modpow(&BigUint::from(2_u8), key.n());
    c.to_u32().ok_or(Error::CiphertextRange(c))
}

/// Encrypt a single plaintext block into a ciphertext block
///
/// errors: returns Error unless the block has exactly PLAIN_BLOCK_LEN alphabet symbols
pub fn encrypt_block(key: &PublicKey, block: &str) -> Result<String, Error> {
    alphabet::check_block_len(block, PLAIN_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;
    let m = alphabet::encode_block(block).map_err(|e| Error::Alphabet(e))?;
    let c = encrypt_value(key, m)?;
    let encrypted = alphabet::decode_block(c, CIPHER_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;

    debug!(block, m, c, encrypted = encrypted.as_str(), "encrypted block");

    Ok(encrypted)
}

/// Encrypt the plaintext under the public key
///
/// The plaintext is uppercased, and rejected if it contains symbols outside the alphabet.
///
/// It is divided into blocks of two symbols, the last block padded with a space if needed.
/// Each block becomes three ciphertext symbols.
pub fn encrypt(key: &PublicKey, plaintext: &str) -> Result<String, Error> {
    let plaintext = alphabet::normalize(plaintext).map_err(|e| Error::Alphabet(e))?;
    let blocks =
        alphabet::divide_message(&plaintext, PLAIN_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;

    let mut ciphertext = String::with_capacity(blocks.len() * CIPHER_BLOCK_LEN);
    for block in blocks.iter() {
        ciphertext.push_str(&encrypt_block(key, block)?);
    }

    Ok(ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_851() -> PublicKey {
        PublicKey::new(BigUint::from(851_u32)).unwrap()
    }

    #[test]
    fn check_encrypt_value() {
        let key = key_851();

        assert_eq!(encrypt_value(&key, 29), Ok(841));
        assert_eq!(encrypt_value(&key, 0), Ok(0));
        assert_eq!(encrypt_value(&key, 1), Ok(1));
        // 728^2 = 529984 = 622 * 851 + 662
        assert_eq!(encrypt_value(&key, 728), Ok(662));
    }

    #[test]
    fn check_encrypt_block() {
        let key = key_851();

        assert_eq!(encrypt_block(&key, "AB").unwrap(), "ADD");
        assert_eq!(encrypt_block(&key, "  ").unwrap(), "   ");
        assert_eq!(
            encrypt_block(&key, "A?"),
            Err(Error::Alphabet(alphabet::Error::InvalidSymbol('?')))
        );

        // short blocks are not padded here, only by encrypt
        assert_eq!(
            encrypt_block(&key, "A"),
            Err(Error::Alphabet(alphabet::Error::BlockSize {
                len: 1,
                expected: PLAIN_BLOCK_LEN
            }))
        );
        // a three symbol value could never be decrypted back
        assert_eq!(
            encrypt_block(&key, "ZZZ"),
            Err(Error::Alphabet(alphabet::Error::BlockSize {
                len: 3,
                expected: PLAIN_BLOCK_LEN
            }))
        );
    }

    #[test]
    fn check_encrypt() {
        let key = key_851();

        assert_eq!(encrypt(&key, "ab").unwrap(), "ADD");
        assert_eq!(encrypt(&key, "").unwrap(), "");

        let ciphertext = encrypt(&key, "MADRID").unwrap();
        assert_eq!(ciphertext.len(), 9);
        assert!(alphabet::validate(&ciphertext));

        // odd length plaintext is padded, "A" encrypts as "A "
        let padded = encrypt(&key, "A").unwrap();
        assert_eq!(padded, encrypt(&key, "A ").unwrap());
        assert_eq!(padded.len(), 3);

        assert_eq!(
            encrypt(&key, "MAD-RID"),
            Err(Error::Alphabet(alphabet::Error::InvalidSymbol('-')))
        );
    }
}
