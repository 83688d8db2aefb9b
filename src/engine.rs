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

//! Transaction engine.
//!
//! The [`Engine`] owns the [`Ledger`] and composes accounts, money
//! conversion and the currency helpers into the bank's use cases. It enforces
//! the rules no single account can: sufficient funds, zero balance before
//! closing, no transfers to self.
//!
//! # Operations
//!
//! - **Deposit**: converts a positive dollar amount to cents and credits it.
//! - **Withdraw**: debits if the balance covers the amount.
//! - **Transfer**: debits the source and credits the destination atomically.
//! - **ATM withdrawal**: whole dollars only, reports the bills dispensed.
//! - **Deposit change**: credits the value of a free-form coin description.
//! - **Close**: removes an account whose balance is exactly zero.
//! - **Monthly interest**: credits interest to every positive balance.
//!
//! Operations that need authorization take an `&Account` obtained from
//! [`Engine::authorize`]. A handle kept past [`Engine::close_account`] is
//! rejected with [`BankError::AccountNotFound`].
//!
//! # Thread Safety
//!
//! Each check-then-mutate step runs under the account lock. Transfers and the
//! interest batch lock accounts in ascending number order.

use crate::account::{Account, AccountData};
use crate::base::{AccountNumber, Owner, Pin};
use crate::currency::{BILL_DENOMINATIONS, Breakdown, breakdown, parse_change};
use crate::ledger::Ledger;
use crate::money::{Cents, monthly_interest, to_minor_units};
use crate::BankError;
use parking_lot::MutexGuard;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub amount: Cents,
    pub source_balance: Cents,
    pub destination_balance: Cents,
}

/// Result of a successful ATM withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtmReceipt {
    pub amount: Cents,
    /// Bills handed out, in whole dollars.
    pub dispensed: Breakdown,
    pub balance: Cents,
}

/// Outcome of depositing loose change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDeposit {
    /// No coins were recognized; the balance is untouched.
    NothingDeposited,
    Deposited { amount: Cents, balance: Cents },
}

/// Transaction engine that owns the ledger.
///
/// # Invariants
///
/// - A debit never exceeds the balance observed under the same lock.
/// - A transfer's debit and credit happen under both account locks, so the
///   sum of the two balances is never observed changed.
/// - Only accounts with a zero balance are removed.
/// - A credit that would overflow a balance fails before any balance changes.
/// - Balances of accounts no longer in the ledger never change.
#[derive(Debug)]
pub struct Engine {
    ledger: Ledger,
}

impl Engine {
    /// Wrong PINs tolerated per authorization.
    pub const MAX_PIN_ATTEMPTS: usize = 3;

    /// Creates an engine with an empty, entropy-seeded ledger.
    pub fn new() -> Self {
        Self::with_ledger(Ledger::new())
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Engine { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Opens a new account for `owner`.
    ///
    /// # Errors
    ///
    /// [`BankError::CapacityExceeded`] if the ledger is full.
    pub fn open_account(&self, owner: Owner) -> Result<Arc<Account>, BankError> {
        self.ledger.open_account(owner)
    }

    /// Looks up `number` and checks up to [`Engine::MAX_PIN_ATTEMPTS`] PINs
    /// drawn lazily from `attempts`.
    ///
    /// The attempt count starts over on every call; nothing is locked out.
    ///
    /// # Errors
    ///
    /// - [`BankError::AccountNotFound`] - Unknown account number.
    /// - [`BankError::AuthorizationFailed`] - Every attempt was wrong, or
    ///   `attempts` ran out first.
    pub fn authorize<I>(&self, number: AccountNumber, attempts: I) -> Result<Arc<Account>, BankError>
    where
        I: IntoIterator<Item = Pin>,
    {
        let account = self
            .ledger
            .find_account(number)
            .ok_or(BankError::AccountNotFound)?;

        for pin in attempts.into_iter().take(Self::MAX_PIN_ATTEMPTS) {
            if account.verify_pin(&pin) {
                return Ok(account);
            }
        }

        warn!(account = %number, "PIN verification failed");
        Err(BankError::AuthorizationFailed)
    }

    /// Deposits a positive dollar `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - `amount` is not positive.
    /// - [`BankError::AmountOutOfRange`] - `amount` or the new balance does
    ///   not fit in cents.
    /// - [`BankError::AccountNotFound`] - The account was closed.
    pub fn deposit(&self, account: &Account, amount: Decimal) -> Result<Cents, BankError> {
        let cents = Self::positive_cents(amount)?;
        let mut data = account.lock();
        self.ensure_open(account)?;
        let balance = data.credit(cents)?;
        debug!(account = %account.number(), amount = cents, balance, "deposit");
        Ok(balance)
    }

    /// Withdraws a positive dollar `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - `amount` is not positive.
    /// - [`BankError::InsufficientFunds`] - `amount` exceeds the balance.
    /// - [`BankError::AccountNotFound`] - The account was closed.
    pub fn withdraw(&self, account: &Account, amount: Decimal) -> Result<Cents, BankError> {
        let cents = Self::positive_cents(amount)?;
        let mut data = account.lock();
        self.ensure_open(account)?;
        Self::ensure_funds(account.number(), &data, cents)?;
        let balance = data.withdraw(cents);
        debug!(account = %account.number(), amount = cents, balance, "withdrawal");
        Ok(balance)
    }

    /// Moves `amount` dollars from `source` to the account `destination`.
    ///
    /// The destination needs no PIN. Both balances change together or not
    /// at all.
    ///
    /// # Errors
    ///
    /// - [`BankError::AccountNotFound`] - No account `destination`, or either
    ///   account was closed.
    /// - [`BankError::SameAccountTransfer`] - `destination` is `source`.
    /// - [`BankError::InvalidAmount`] - `amount` is not positive.
    /// - [`BankError::InsufficientFunds`] - `amount` exceeds the source balance.
    /// - [`BankError::AmountOutOfRange`] - The destination balance would
    ///   overflow.
    pub fn transfer(
        &self,
        source: &Account,
        destination: AccountNumber,
        amount: Decimal,
    ) -> Result<TransferReceipt, BankError> {
        let destination = self
            .ledger
            .find_account(destination)
            .ok_or(BankError::AccountNotFound)?;
        if destination.number() == source.number() {
            return Err(BankError::SameAccountTransfer);
        }
        let cents = Self::positive_cents(amount)?;

        let (mut from, mut to) = lock_pair(source, &destination);
        self.ensure_open(source)?;
        self.ensure_open(&destination)?;
        Self::ensure_funds(source.number(), &from, cents)?;
        // Credit first: it is the only step that can fail.
        let destination_balance = to.credit(cents)?;
        let source_balance = from.withdraw(cents);
        drop((from, to));

        debug!(
            source = %source.number(),
            destination = %destination.number(),
            amount = cents,
            "transfer"
        );
        Ok(TransferReceipt {
            amount: cents,
            source_balance,
            destination_balance,
        })
    }

    /// Withdraws a whole-dollar `amount` as bills.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - `amount` is not positive.
    /// - [`BankError::FractionalAmount`] - `amount` has a fractional part.
    /// - [`BankError::InsufficientFunds`] - `amount` exceeds the balance.
    /// - [`BankError::AccountNotFound`] - The account was closed.
    pub fn atm_withdraw(&self, account: &Account, amount: Decimal) -> Result<AtmReceipt, BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        if !amount.fract().is_zero() {
            return Err(BankError::FractionalAmount);
        }
        let cents = to_minor_units(amount)?;
        let dollars = amount.to_u64().ok_or(BankError::AmountOutOfRange)?;

        let mut data = account.lock();
        self.ensure_open(account)?;
        Self::ensure_funds(account.number(), &data, cents)?;
        let dispensed = breakdown(dollars, &BILL_DENOMINATIONS);
        let balance = data.withdraw(cents);

        debug!(account = %account.number(), amount = cents, balance, "ATM withdrawal");
        Ok(AtmReceipt {
            amount: cents,
            dispensed,
            balance,
        })
    }

    /// Deposits the value of a coin description such as `"10q 3d 7n 5p"`.
    ///
    /// # Errors
    ///
    /// - [`BankError::AmountOutOfRange`] - The coins or the new balance
    ///   overflow.
    /// - [`BankError::AccountNotFound`] - The account was closed.
    pub fn deposit_change(&self, account: &Account, coins: &str) -> Result<ChangeDeposit, BankError> {
        let amount = parse_change(coins)?;
        let mut data = account.lock();
        self.ensure_open(account)?;
        if amount <= 0 {
            return Ok(ChangeDeposit::NothingDeposited);
        }
        let balance = data.credit(amount)?;
        debug!(account = %account.number(), amount, balance, "change deposit");
        Ok(ChangeDeposit::Deposited { amount, balance })
    }

    /// Replaces the PIN after checking the confirmation.
    ///
    /// # Errors
    ///
    /// - [`BankError::PinUnchanged`] - `new_pin` equals the current PIN.
    /// - [`BankError::PinMismatch`] - `confirmation` differs from `new_pin`.
    /// - [`BankError::AccountNotFound`] - The account was closed.
    pub fn change_pin(&self, account: &Account, new_pin: Pin, confirmation: &Pin) -> Result<(), BankError> {
        let mut data = account.lock();
        self.ensure_open(account)?;
        if *data.pin() == new_pin {
            return Err(BankError::PinUnchanged);
        }
        if *confirmation != new_pin {
            return Err(BankError::PinMismatch);
        }
        data.set_pin(new_pin);
        info!(account = %account.number(), "PIN changed");
        Ok(())
    }

    /// Closes `account`, which must have a zero balance.
    ///
    /// # Errors
    ///
    /// - [`BankError::NonZeroBalance`] - The balance is not exactly zero.
    /// - [`BankError::AccountNotFound`] - The account was already closed.
    pub fn close_account(&self, account: &Account) -> Result<(), BankError> {
        let data = account.lock();
        self.ensure_open(account)?;
        if data.balance() != 0 {
            return Err(BankError::NonZeroBalance);
        }
        // Held across removal so no deposit lands on a closing account.
        if !self.ledger.remove_registered(account) {
            return Err(BankError::AccountNotFound);
        }
        drop(data);

        info!(account = %account.number(), "account closed");
        Ok(())
    }

    /// Credits one month of interest at `annual_rate` percent to every
    /// account with a positive balance.
    ///
    /// Returns how many accounts received a non-zero amount. A positive
    /// balance whose interest rounds to 0 cents is left as is and not
    /// counted as updated. Every interest amount and every new balance is
    /// computed before anything is credited, so an error leaves every
    /// balance untouched.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidRate`] - `annual_rate` is negative.
    /// - [`BankError::AmountOutOfRange`] - Some interest amount or new
    ///   balance overflows.
    pub fn apply_monthly_interest(&self, annual_rate: Decimal) -> Result<usize, BankError> {
        if annual_rate < Decimal::ZERO {
            return Err(BankError::InvalidRate);
        }

        let accounts = self.ledger.accounts();
        let mut locked: Vec<MutexGuard<'_, AccountData>> =
            accounts.iter().map(|account| account.lock()).collect();
        let interest = locked
            .iter()
            .map(|data| -> Result<Cents, BankError> {
                let interest = monthly_interest(data.balance(), annual_rate)?;
                data.balance_after_credit(interest)?;
                Ok(interest)
            })
            .collect::<Result<Vec<Cents>, BankError>>()?;

        let mut updated = 0;
        for (data, interest) in locked.iter_mut().zip(interest) {
            if interest > 0 {
                // Checked above.
                data.deposit(interest);
                updated += 1;
            }
        }
        drop(locked);

        info!(%annual_rate, updated, "monthly interest applied");
        Ok(updated)
    }

    fn positive_cents(amount: Decimal) -> Result<Cents, BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        to_minor_units(amount)
    }

    fn ensure_open(&self, account: &Account) -> Result<(), BankError> {
        if self.ledger.is_registered(account) {
            Ok(())
        } else {
            Err(BankError::AccountNotFound)
        }
    }

    fn ensure_funds(number: AccountNumber, data: &AccountData, amount: Cents) -> Result<(), BankError> {
        if amount > data.balance() {
            debug!(account = %number, amount, balance = data.balance(), "insufficient funds");
            return Err(BankError::InsufficientFunds);
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Locks two distinct accounts in ascending number order, returning the
/// guards as `(first, second)`.
fn lock_pair<'a>(
    first: &'a Account,
    second: &'a Account,
) -> (MutexGuard<'a, AccountData>, MutexGuard<'a, AccountData>) {
    if first.number() < second.number() {
        let a = first.lock();
        let b = second.lock();
        (a, b)
    } else {
        let b = second.lock();
        let a = first.lock();
        (a, b)
    }
}
