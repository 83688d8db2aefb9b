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

//! Account management.
//!
//! An [`Account`] pairs an immutable identity (number and owner) with a
//! mutable state (PIN and balance) behind its own lock. Balances change only
//! through [`Account::deposit`] and [`Account::withdraw`], in whole cents.
//!
//! # Example
//!
//! ```
//! use bank_ledger_rs::{Account, AccountNumber, Owner};
//!
//! let owner = Owner::new("Ada", "Lovelace", "123456789".parse().unwrap()).unwrap();
//! let account = Account::new(
//!     AccountNumber::new(12_345_678).unwrap(),
//!     owner,
//!     "0319".parse().unwrap(),
//! );
//! assert_eq!(account.deposit(1999), 1999);
//! assert!(account.verify_pin(&"0319".parse().unwrap()));
//! ```

use crate::BankError;
use crate::base::{AccountNumber, Owner, Pin};
use crate::money::{Cents, format_cents, to_major_units};
use parking_lot::{Mutex, MutexGuard};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

const RULE: &str = "============================================================";

#[derive(Debug)]
pub(crate) struct AccountData {
    pin: Pin,
    balance: Cents,
}

impl AccountData {
    pub(crate) fn balance(&self) -> Cents {
        self.balance
    }

    pub(crate) fn pin(&self) -> &Pin {
        &self.pin
    }

    pub(crate) fn set_pin(&mut self, pin: Pin) {
        self.pin = pin;
    }

    /// Increases the balance. Amounts are non-negative and the sum must fit
    /// in [`Cents`].
    pub(crate) fn deposit(&mut self, amount: Cents) -> Cents {
        debug_assert!(amount >= 0, "deposit of negative amount: {amount}");
        self.balance += amount;
        self.balance
    }

    /// Balance after crediting `amount`, without changing it.
    pub(crate) fn balance_after_credit(&self, amount: Cents) -> Result<Cents, BankError> {
        self.balance
            .checked_add(amount)
            .ok_or(BankError::AmountOutOfRange)
    }

    /// Increases the balance, or leaves it untouched if the sum overflows.
    pub(crate) fn credit(&mut self, amount: Cents) -> Result<Cents, BankError> {
        self.balance = self.balance_after_credit(amount)?;
        Ok(self.balance)
    }

    /// Decreases the balance without checking for sufficient funds.
    pub(crate) fn withdraw(&mut self, amount: Cents) -> Cents {
        self.balance -= amount;
        self.balance
    }
}

/// Ledger account.
///
/// Withdrawals are not checked against the balance here; the engine decides
/// whether a debit is allowed and holds the account lock while it does.
#[derive(Debug)]
pub struct Account {
    number: AccountNumber,
    owner: Owner,
    inner: Mutex<AccountData>,
}

impl Account {
    /// Creates an account with a zero balance.
    pub fn new(number: AccountNumber, owner: Owner, pin: Pin) -> Self {
        Self {
            number,
            owner,
            inner: Mutex::new(AccountData { pin, balance: 0 }),
        }
    }

    pub fn number(&self) -> AccountNumber {
        self.number
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn pin(&self) -> Pin {
        self.inner.lock().pin.clone()
    }

    pub fn balance(&self) -> Cents {
        self.inner.lock().balance
    }

    /// Adds `amount` cents and returns the new balance.
    ///
    /// No upper bound is enforced here; the sum must fit in [`Cents`].
    /// [`Engine`](crate::Engine) credits through an overflow-checked path.
    pub fn deposit(&self, amount: Cents) -> Cents {
        self.inner.lock().deposit(amount)
    }

    /// Subtracts `amount` cents and returns the new balance, which may be
    /// negative.
    pub fn withdraw(&self, amount: Cents) -> Cents {
        self.inner.lock().withdraw(amount)
    }

    /// Returns `true` if `candidate` equals the stored PIN.
    pub fn verify_pin(&self, candidate: &Pin) -> bool {
        self.inner.lock().pin == *candidate
    }

    /// Replaces the PIN.
    pub fn set_pin(&self, pin: Pin) {
        self.inner.lock().set_pin(pin);
    }

    /// Locks the mutable state for a check-then-mutate sequence.
    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountData> {
        self.inner.lock()
    }
}

/// Renders the account statement with the SSN masked.
impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.lock();
        let lines = [
            RULE.to_string(),
            format!("Account Number: {}", self.number),
            format!("Owner First Name: {}", self.owner.first_name()),
            format!("Owner Last Name: {}", self.owner.last_name()),
            format!("Owner SSN: {}", self.owner.tax_id().masked()),
            format!("PIN: {}", data.pin),
            format!("Balance: {}", format_cents(data.balance)),
            RULE.to_string(),
        ];
        f.write_str(&lines.join("\n\n"))
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let balance = self.balance();
        let mut state = serializer.serialize_struct("Account", 5)?;
        state.serialize_field("account", &self.number)?;
        state.serialize_field("first_name", self.owner.first_name())?;
        state.serialize_field("last_name", self.owner.last_name())?;
        state.serialize_field("tax_id", &self.owner.tax_id().masked())?;
        state.serialize_field("balance", &to_major_units(balance))?;
        state.end()
    }
}
