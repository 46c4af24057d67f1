use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use tracing::{debug, warn};

use crate::alphabet::{self, PLAIN_BLOCK_LEN};

/// Default number of selections requested per block before decryption is abandoned
pub const DEFAULT_MAX_SELECTIONS: usize = 8;

#[derive(Debug, PartialEq)]
pub enum Error {
    Alphabet(alphabet::Error),
    NoSelections,
    SelectionOutOfRange { selection: usize, count: usize },
    SelectionsExhausted { block: String, attempts: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alphabet(e) => write!(f, "encoding error: {}", e),
            Error::NoSelections => write!(f, "at least one selection must be allowed"),
            Error::SelectionOutOfRange { selection, count } => write!(
                f,
                "selection {} is out of range for {} candidates",
                selection, count
            ),
            Error::SelectionsExhausted { block, attempts } => write!(
                f,
                "no valid selection for block {:?} after {} attempts",
                block, attempts
            ),
        }
    }
}

/// Plaintext guess for a ciphertext block
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Sign case the guess came from: 1 (+r, +s), 2 (+r, -s), 3 (-r, +s), 4 (-r, -s)
    pub case: u8,
    /// Numeric value of the guess, always below 27^2
    pub value: u32,
    /// Decoded plaintext block
    pub block: String,
}

/// Valid plaintext guesses for one ciphertext block, in sign case order
#[derive(Clone, Debug, PartialEq)]
pub struct Candidates {
    ciphertext: String,
    entries: Vec<Candidate>,
    blocks: Vec<String>,
}

impl Candidates {
    /// Create a candidate set for the given ciphertext block
    pub fn new(ciphertext: &str, entries: Vec<Candidate>) -> Self {
        let blocks = entries.iter().map(|c| c.block.clone()).collect();
        Self {
            ciphertext: ciphertext.into(),
            entries: entries,
            blocks: blocks,
        }
    }

    /// Get the ciphertext block the candidates were derived from
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// Get the candidates
    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }

    /// Get the decoded plaintext blocks, as shown to a Disambiguator
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Select a candidate by index
    ///
    /// errors: returns Error if the index is out of range
    pub fn select(&self, selection: usize) -> Result<&Candidate, Error> {
        self.entries.get(selection).ok_or(Error::SelectionOutOfRange {
            selection: selection,
            count: self.entries.len(),
        })
    }
}

/// Chooses the correct plaintext block among the candidates of a ciphertext block
///
/// Every Rabin decryption yields up to four square roots, only context can tell which
/// one was encrypted. Implementations can prompt a user, consult a language model,
/// or know the answer already.
pub trait Disambiguator {
    /// Return the index of the correct candidate
    ///
    /// `plaintext` is the plaintext recovered so far
    fn choose(&mut self, plaintext: &str, candidates: &[String]) -> usize;

    /// Called when the previous choice was out of range, before choosing again
    fn rejected(&mut self, _selection: usize, _count: usize) {}
}

impl<F> Disambiguator for F
where
    F: FnMut(&str, &[String]) -> usize,
{
    fn choose(&mut self, plaintext: &str, candidates: &[String]) -> usize {
        self(plaintext, candidates)
    }
}

/// Disambiguator that knows the plaintext
///
/// Picks the candidate equal to the next expected block, and an out-of-range index when
/// no candidate matches. Useful for batch runs and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct Oracle {
    blocks: Vec<String>,
}

impl Oracle {
    /// Create an oracle for the expected plaintext
    ///
    /// errors: returns Error if the plaintext contains symbols outside the alphabet
    pub fn new(plaintext: &str) -> Result<Self, Error> {
        let plaintext = alphabet::normalize(plaintext).map_err(|e| Error::Alphabet(e))?;
        let blocks =
            alphabet::divide_message(&plaintext, PLAIN_BLOCK_LEN).map_err(|e| Error::Alphabet(e))?;

        Ok(Self { blocks: blocks })
    }

    /// Get the expected plaintext, padded to whole blocks
    pub fn expected(&self) -> String {
        self.blocks.concat()
    }
}

impl Disambiguator for Oracle {
    fn choose(&mut self, plaintext: &str, candidates: &[String]) -> usize {
        let position = plaintext.chars().count() / PLAIN_BLOCK_LEN;

        self.blocks
            .get(position)
            .and_then(|expected| candidates.iter().position(|c| c == expected))
            .unwrap_or(candidates.len())
    }
}

/// Ask the disambiguator for a candidate until it picks a valid one
///
/// Out-of-range selections are reported back through `Disambiguator::rejected`.
///
/// errors: returns Error if `max_selections` is zero, and after `max_selections`
/// out-of-range selections
pub fn resolve<'a, D>(
    candidates: &'a Candidates,
    plaintext: &str,
    disambiguator: &mut D,
    max_selections: usize,
) -> Result<&'a Candidate, Error>
where
    D: Disambiguator + ?Sized,
{
    if max_selections == 0 {
        return Err(Error::NoSelections);
    }

    for _attempt in 0..max_selections {
        let selection = disambiguator.choose(plaintext, candidates.blocks());

        match candidates.select(selection) {
            Ok(candidate) => {
                debug!(
                    ciphertext = candidates.ciphertext(),
                    selection,
                    block = candidate.block.as_str(),
                    "candidate selected"
                );
                return Ok(candidate);
            }
            Err(Error::SelectionOutOfRange { selection, count }) => {
                warn!(selection, count, "selection out of range, try again");
                disambiguator.rejected(selection, count);
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::SelectionsExhausted {
        block: candidates.ciphertext().into(),
        attempts: max_selections,
    })
}
