use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Ordered alphabet, each symbol's digit value is its position in the list
pub const ALPHABET: [char; 27] = [
    ' ', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Numeric base of encoded blocks
pub const BASE: u32 = 27;

/// Padding symbol for short final blocks
pub const PAD: char = ' ';

/// Length of a plaintext block in symbols
pub const PLAIN_BLOCK_LEN: usize = 2;

/// Length of a ciphertext block in symbols
pub const CIPHER_BLOCK_LEN: usize = 3;

/// Longest block whose value fits a u32 (27^6 < 2^32 < 27^7)
pub const MAX_BLOCK_LEN: usize = 6;

/// Exclusive upper bound of plaintext block values (27^2)
pub const PLAIN_LIMIT: u32 = BASE * BASE;

/// Exclusive upper bound of ciphertext block values (27^3)
pub const CIPHER_LIMIT: u32 = BASE * BASE * BASE;

#[derive(Debug, PartialEq)]
pub enum Error {
    BlockLength,
    BlockSize { len: usize, expected: usize },
    BlockTooLong(usize),
    InvalidDigit(u32),
    InvalidSymbol(char),
    ValueRange(u32, usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BlockLength => write!(f, "block length must be non-zero"),
            Error::BlockSize { len, expected } => {
                write!(f, "block has {} symbols, expected {}", len, expected)
            }
            Error::BlockTooLong(len) => {
                write!(f, "block of {} symbols exceeds {} symbols", len, MAX_BLOCK_LEN)
            }
            Error::InvalidDigit(d) => write!(f, "digit {} is outside the alphabet", d),
            Error::InvalidSymbol(c) => write!(f, "symbol {:?} is outside the alphabet", c),
            Error::ValueRange(v, len) => {
                write!(f, "value {} does not fit a block of {} symbols", v, len)
            }
        }
    }
}

/// Get the digit value of a symbol
pub fn index(symbol: char) -> Result<u32, Error> {
    for (i, &s) in ALPHABET.iter().enumerate() {
        if s == symbol {
            return Ok(i as u32);
        }
    }
    Err(Error::InvalidSymbol(symbol))
}

/// Get the symbol for a digit value
pub fn symbol(digit: u32) -> Result<char, Error> {
    ALPHABET
        .get(digit as usize)
        .copied()
        .ok_or(Error::InvalidDigit(digit))
}

/// Check that every character of the text is in the alphabet
pub fn validate(text: &str) -> bool {
    text.chars().all(|c| index(c).is_ok())
}

/// Uppercase the text, and check it only contains alphabet symbols
///
/// errors: returns the first symbol outside the alphabet
pub fn normalize(text: &str) -> Result<String, Error> {
    let upper = text.to_uppercase();
    for c in upper.chars() {
        index(c)?;
    }
    Ok(upper)
}

/// Divide the message into blocks of `len` symbols
///
/// If the last block is short, it is padded with spaces.
///
/// Symbols are not validated, an empty message has no blocks.
pub fn divide_message(message: &str, len: usize) -> Result<Vec<String>, Error> {
    if len == 0 {
        return Err(Error::BlockLength);
    }

    let symbols: Vec<char> = message.chars().collect();
    let mut blocks = Vec::with_capacity((symbols.len() + len - 1) / len);

    for chunk in symbols.chunks(len) {
        let mut block: String = chunk.iter().collect();
        for _i in chunk.len()..len {
            block.push(PAD);
        }
        blocks.push(block);
    }

    Ok(blocks)
}

/// Get the base-27 numeric value of a block, first symbol most significant
///
/// errors: returns Error on symbols outside the alphabet, and blocks longer than MAX_BLOCK_LEN
pub fn encode_block(block: &str) -> Result<u32, Error> {
    let len = block.chars().count();
    if len > MAX_BLOCK_LEN {
        return Err(Error::BlockTooLong(len));
    }

    let mut value = 0_u32;
    for c in block.chars() {
        value = value * BASE + index(c)?;
    }
    Ok(value)
}

/// Check that the block has exactly `expected` symbols
pub fn check_block_len(block: &str, expected: usize) -> Result<(), Error> {
    let len = block.chars().count();
    if len != expected {
        return Err(Error::BlockSize {
            len: len,
            expected: expected,
        });
    }
    Ok(())
}

/// Decode a numeric value into a block of `len` symbols
///
/// errors: returns Error if the value needs more than `len` symbols
pub fn decode_block(value: u32, len: usize) -> Result<String, Error> {
    if len > MAX_BLOCK_LEN {
        return Err(Error::BlockTooLong(len));
    }

    let mut digits = Vec::with_capacity(len);
    let mut rest = value;
    for _i in 0..len {
        digits.push(rest % BASE);
        rest /= BASE;
    }

    if rest != 0 {
        return Err(Error::ValueRange(value, len));
    }

    digits.iter().rev().map(|&d| symbol(d)).collect()
}
