// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Validated identity values.
//!
//! Raw user input is parsed into these types at the boundary, so the ledger
//! and engine never re-check digit counts or blank names.

use crate::BankError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Eight-digit account number whose first digit is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountNumber(u32);

impl AccountNumber {
    pub const MIN: u32 = 10_000_000;
    pub const MAX: u32 = 99_999_999;

    pub fn new(value: u32) -> Result<Self, BankError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(BankError::InvalidAccountNumber)
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for AccountNumber {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_digits(s, 8) || s.starts_with('0') {
            return Err(BankError::InvalidAccountNumber);
        }
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| BankError::InvalidAccountNumber)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Four-digit PIN, kept as text so `0319` stays distinct from `319`.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Largest index accepted by [`Pin::from_index`].
    pub const MAX_INDEX: u16 = 9999;

    /// Builds the zero-padded PIN for `index` (`7` becomes `0007`).
    pub fn from_index(index: u16) -> Result<Self, BankError> {
        if index > Self::MAX_INDEX {
            return Err(BankError::InvalidPin);
        }
        Ok(Self(format!("{index:04}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Pin {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_digits(s, 4) {
            Ok(Self(s.to_string()))
        } else {
            Err(BankError::InvalidPin)
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keeps PINs out of debug output and logs.
impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// Nine-digit taxpayer identification number.
///
/// Stored in full; both `Display` and `Debug` render the masked form
/// `XXX-XX-1234`.
#[derive(Clone, PartialEq, Eq)]
pub struct TaxId(String);

impl TaxId {
    /// Returns the masked form, exposing only the last four digits.
    pub fn masked(&self) -> String {
        format!("XXX-XX-{}", &self.0[5..])
    }

    /// Returns the full, unmasked digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TaxId {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_digits(s, 9) {
            Ok(Self(s.to_string()))
        } else {
            Err(BankError::InvalidTaxId)
        }
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaxId({})", self.masked())
    }
}

/// Identity of an account holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    first_name: String,
    last_name: String,
    tax_id: TaxId,
}

impl Owner {
    /// Creates an owner, trimming both names.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::EmptyName`] if either name is blank.
    pub fn new(first_name: &str, last_name: &str, tax_id: TaxId) -> Result<Self, BankError> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(BankError::EmptyName);
        }
        Ok(Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            tax_id,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }
}
