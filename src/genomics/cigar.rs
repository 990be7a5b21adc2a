//! Decoding of run-length encoded CIGAR strings.

use thiserror::Error;

use crate::genomics::{Cigar, CigarOp, CigarOpKind};

/// Reasons a CIGAR string fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CigarParseError {
    /// The CIGAR field was empty.
    #[error("malformed operation string: empty")]
    Empty,

    /// A byte outside `[0-9A-Za-z=]` was found.
    #[error("malformed operation string {cigar:?}: unexpected character {found:?} at offset {offset}")]
    InvalidCharacter {
        /// Full input string.
        cigar: String,
        /// Offending character.
        found: char,
        /// Byte offset of the character.
        offset: usize,
    },

    /// A letter that is not an operation code terminated a digit run.
    #[error("malformed operation string {cigar:?}: unknown operation {found:?} at offset {offset}")]
    UnknownOperation {
        /// Full input string.
        cigar: String,
        /// Offending letter.
        found: char,
        /// Byte offset of the letter.
        offset: usize,
    },

    /// An operation code was not preceded by a length.
    #[error("malformed operation string {cigar:?}: operation at offset {offset} has no length")]
    MissingLength {
        /// Full input string.
        cigar: String,
        /// Byte offset of the operation code.
        offset: usize,
    },

    /// The string ended on a digit run with no operation code.
    #[error("malformed operation string {cigar:?}: trailing length without operation")]
    UnterminatedLength {
        /// Full input string.
        cigar: String,
    },

    /// A length was zero, zero-padded, or larger than `u32::MAX`.
    #[error("malformed operation string {cigar:?}: invalid length at offset {offset}")]
    InvalidLength {
        /// Full input string.
        cigar: String,
        /// Byte offset where the length starts.
        offset: usize,
    },
}

/// Decode a CIGAR string such as `5M3S` into its operations.
///
/// The decoded operations cover the input exactly, left to right, so
/// `parse_cigar(s)?.to_string() == s` for every accepted `s`.
pub fn parse_cigar(cigar: &str) -> Result<Cigar, CigarParseError> {
    if cigar.is_empty() {
        return Err(CigarParseError::Empty);
    }

    let bytes = cigar.as_bytes();
    let mut ops = Vec::with_capacity(bytes.len() / 2);
    let mut len: Option<u32> = None;
    let mut len_start = 0;

    for (offset, &byte) in bytes.iter().enumerate() {
        if byte.is_ascii_digit() {
            if len.is_none() {
                len_start = offset;
            }
            let digit = u32::from(byte - b'0');
            let next = len
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|value| value.checked_add(digit))
                .ok_or_else(|| CigarParseError::InvalidLength {
                    cigar: cigar.to_string(),
                    offset: len_start,
                })?;
            len = Some(next);
            continue;
        }

        if !(byte.is_ascii_alphabetic() || byte == b'=') {
            return Err(CigarParseError::InvalidCharacter {
                cigar: cigar.to_string(),
                found: cigar[offset..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER),
                offset,
            });
        }

        let kind = CigarOpKind::from_code(byte).ok_or_else(|| CigarParseError::UnknownOperation {
            cigar: cigar.to_string(),
            found: byte as char,
            offset,
        })?;

        match len.take() {
            None => {
                return Err(CigarParseError::MissingLength {
                    cigar: cigar.to_string(),
                    offset,
                })
            }
            Some(_) if bytes[len_start] == b'0' => {
                return Err(CigarParseError::InvalidLength {
                    cigar: cigar.to_string(),
                    offset: len_start,
                })
            }
            Some(value) => ops.push(CigarOp::new(kind, value)),
        }
    }

    if len.is_some() {
        return Err(CigarParseError::UnterminatedLength {
            cigar: cigar.to_string(),
        });
    }

    Ok(Cigar::from_ops(ops))
}
