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

//! Error types for ledger operations.

use thiserror::Error;

/// Broad category of a [`BankError`].
///
/// Callers that only need to decide how to report a failure can match on the
/// kind instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, rejected before any state changes.
    Validation,
    /// Unknown account number.
    NotFound,
    /// PIN mismatch after all allowed attempts.
    AuthorizationFailed,
    /// Withdrawal or transfer exceeds the balance.
    InsufficientFunds,
    /// The ledger is full.
    CapacityExceeded,
    /// Well-formed request that the current state does not allow.
    InvalidOperation,
}

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Account number is not 8 digits or starts with 0
    #[error("invalid account number (must be 8 digits, not starting with 0)")]
    InvalidAccountNumber,

    /// PIN is not exactly 4 digits
    #[error("invalid PIN (must be exactly 4 digits)")]
    InvalidPin,

    /// Tax ID is not exactly 9 digits
    #[error("invalid SSN (must be exactly 9 digits)")]
    InvalidTaxId,

    /// Owner first or last name is blank
    #[error("name cannot be empty")]
    EmptyName,

    /// Amount is zero, negative, or not a number
    #[error("invalid amount (must be a number greater than 0)")]
    InvalidAmount,

    /// Amount does not fit in the minor-unit representation
    #[error("amount out of range")]
    AmountOutOfRange,

    /// Interest rate is negative or not a number
    #[error("invalid rate (must be a non-negative number)")]
    InvalidRate,

    /// New PIN and its confirmation differ
    #[error("PINs do not match")]
    PinMismatch,

    /// No account with the given number
    #[error("account not found")]
    AccountNotFound,

    /// Every allowed PIN attempt was wrong
    #[error("incorrect PIN")]
    AuthorizationFailed,

    /// Withdrawal or transfer would exceed the balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// The ledger already holds its maximum number of accounts
    #[error("bank is full")]
    CapacityExceeded,

    /// Source and destination of a transfer are the same account
    #[error("cannot transfer to the same account")]
    SameAccountTransfer,

    /// Only accounts with a zero balance can be closed
    #[error("account must have a zero balance to close")]
    NonZeroBalance,

    /// ATM withdrawals must be whole dollars
    #[error("ATM can only dispense whole dollars")]
    FractionalAmount,

    /// New PIN is identical to the current one
    #[error("new PIN cannot be the same as the current PIN")]
    PinUnchanged,
}

impl BankError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAccountNumber
            | Self::InvalidPin
            | Self::InvalidTaxId
            | Self::EmptyName
            | Self::InvalidAmount
            | Self::AmountOutOfRange
            | Self::InvalidRate
            | Self::PinMismatch => ErrorKind::Validation,
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::AuthorizationFailed => ErrorKind::AuthorizationFailed,
            Self::InsufficientFunds => ErrorKind::InsufficientFunds,
            Self::CapacityExceeded => ErrorKind::CapacityExceeded,
            Self::SameAccountTransfer
            | Self::NonZeroBalance
            | Self::FractionalAmount
            | Self::PinUnchanged => ErrorKind::InvalidOperation,
        }
    }
}
