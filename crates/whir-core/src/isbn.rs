// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ISBN validation for Bookland EAN-13 barcodes.
//
// Books carry their ISBN as a 13-digit EAN-13 with a 978 or 979 prefix.
// A payload passes if either the ISBN-13 check digit matches, or the legacy
// ISBN-10 checksum holds over the nine digits following the prefix with the
// final barcode digit as check digit.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WhirError};

/// Number of digits in a Bookland barcode.
pub const ISBN_LENGTH: usize = 13;

/// Prefixes reserved for books in the EAN numbering system.
pub const BOOKLAND_PREFIXES: [&str; 2] = ["978", "979"];

/// Whether `payload` is a valid 13-digit ISBN barcode.
///
/// Total over any input: malformed strings simply return `false`.
pub fn is_valid(payload: &str) -> bool {
    let Some(digits) = digits(payload) else {
        return false;
    };
    if !BOOKLAND_PREFIXES.iter().any(|p| payload.starts_with(p)) {
        return false;
    }
    isbn10_checksum_holds(&digits) || isbn13_checksum_holds(&digits)
}

/// Compute the ISBN-13 check digit for the first twelve digits.
///
/// Returns `None` unless `first_twelve` is exactly twelve ASCII digits.
pub fn isbn13_check_digit(first_twelve: &str) -> Option<u8> {
    if first_twelve.len() != ISBN_LENGTH - 1 || !first_twelve.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let weighted: u32 = first_twelve
        .bytes()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    let modulus = weighted % 10;
    Some(if modulus == 0 { 0 } else { (10 - modulus) as u8 })
}

/// Split a payload into its 13 digit values, or `None` if it is not exactly
/// thirteen ASCII digits.
fn digits(payload: &str) -> Option<[u8; ISBN_LENGTH]> {
    if payload.len() != ISBN_LENGTH {
        return None;
    }
    let mut out = [0u8; ISBN_LENGTH];
    for (slot, b) in out.iter_mut().zip(payload.bytes()) {
        if !b.is_ascii_digit() {
            return None;
        }
        *slot = b - b'0';
    }
    Some(out)
}

fn isbn10_checksum_holds(digits: &[u8; ISBN_LENGTH]) -> bool {
    let weighted: u32 = digits[3..12]
        .iter()
        .zip((2..=10u32).rev())
        .map(|(d, w)| u32::from(*d) * w)
        .sum();
    (weighted + u32::from(digits[12])) % 11 == 0
}

fn isbn13_checksum_holds(digits: &[u8; ISBN_LENGTH]) -> bool {
    let weighted: u32 = digits[..12]
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    let modulus = weighted % 10;
    let expected = if modulus == 0 { 0 } else { 10 - modulus };
    expected == u32::from(digits[12])
}

/// A validated ISBN, as handed to lookup collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(payload: &str) -> Result<Self> {
        if is_valid(payload) {
            Ok(Self(payload.to_owned()))
        } else {
            Err(WhirError::InvalidIsbn(payload.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
