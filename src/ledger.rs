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

//! The authoritative collection of accounts.
//!
//! # Thread Safety
//!
//! Accounts live in a [`DashMap`] so lookups never block each other.
//! Structural changes (adding, removing, allocating numbers, opening) are
//! serialized under a single allocator lock that also owns the random
//! generator. Lookups hand out `Arc<Account>` clones and never keep a map
//! guard alive, so callers may lock accounts freely afterwards.

use crate::BankError;
use crate::account::Account;
use crate::base::{AccountNumber, Owner, Pin};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ptr;
use std::sync::Arc;
use tracing::info;

/// In-memory bank ledger holding at most [`Ledger::MAX_ACCOUNTS`] accounts.
///
/// # Invariants
///
/// - Every key equals the `number` of the account stored under it.
/// - Account numbers are unique and within `10_000_000..=99_999_999`.
/// - The number of accounts never exceeds the configured capacity.
#[derive(Debug)]
pub struct Ledger {
    accounts: DashMap<AccountNumber, Arc<Account>>,
    /// Serializes structural changes; owns the generator.
    allocator: Mutex<StdRng>,
    capacity: usize,
}

impl Ledger {
    pub const MAX_ACCOUNTS: usize = 100;

    /// Creates an empty ledger seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty ledger whose numbers and PINs are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            accounts: DashMap::new(),
            allocator: Mutex::new(rng),
            capacity: Self::MAX_ACCOUNTS,
        }
    }

    /// Lowers the capacity. Values above [`Ledger::MAX_ACCOUNTS`] are capped.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.min(Self::MAX_ACCOUNTS);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Inserts `account`.
    ///
    /// Returns `false` if the ledger is full or the number is already taken.
    pub fn add_account(&self, account: Account) -> bool {
        let _allocator = self.allocator.lock();
        self.insert(Arc::new(account))
    }

    /// Caller must hold the allocator lock.
    fn insert(&self, account: Arc<Account>) -> bool {
        if self.is_full() {
            return false;
        }
        match self.accounts.entry(account.number()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(account);
                true
            }
        }
    }

    /// Removes the account with `number`. Returns `true` if one existed.
    pub fn remove_account(&self, number: AccountNumber) -> bool {
        let _allocator = self.allocator.lock();
        self.accounts.remove(&number).is_some()
    }

    /// Removes `account` only if it is the instance registered under its
    /// number. Returns `true` if it was removed.
    pub fn remove_registered(&self, account: &Account) -> bool {
        let _allocator = self.allocator.lock();
        self.accounts
            .remove_if(&account.number(), |_, registered| {
                ptr::eq(Arc::as_ptr(registered), account)
            })
            .is_some()
    }

    /// Returns `true` if `account` itself, not just its number, is in the
    /// ledger.
    pub fn is_registered(&self, account: &Account) -> bool {
        self.accounts
            .get(&account.number())
            .is_some_and(|entry| ptr::eq(Arc::as_ptr(entry.value()), account))
    }

    /// Looks up an account by number.
    pub fn find_account(&self, number: AccountNumber) -> Option<Arc<Account>> {
        self.accounts.get(&number).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns a snapshot of all accounts ordered by number.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<Arc<Account>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_unstable_by_key(|account| account.number());
        accounts
    }

    /// Draws a random account number not currently in use.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::CapacityExceeded`] if the ledger is full.
    pub fn generate_unique_number(&self) -> Result<AccountNumber, BankError> {
        let mut rng = self.allocator.lock();
        self.next_number(&mut rng)
    }

    /// Caller must hold the allocator lock.
    fn next_number(&self, rng: &mut StdRng) -> Result<AccountNumber, BankError> {
        // Checked upfront so the draw loop always has a free slot to find.
        if self.is_full() {
            return Err(BankError::CapacityExceeded);
        }
        loop {
            let drawn = rng.gen_range(AccountNumber::MIN..=AccountNumber::MAX);
            let candidate = AccountNumber::new(drawn)?;
            if !self.accounts.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Draws a uniform PIN in `0000..=9999`. PINs need not be unique.
    pub fn generate_pin(&self) -> Pin {
        let mut rng = self.allocator.lock();
        Self::next_pin(&mut rng)
    }

    fn next_pin(rng: &mut StdRng) -> Pin {
        let index = rng.gen_range(0..=Pin::MAX_INDEX);
        Pin::from_index(index).unwrap_or_else(|_| unreachable!("PIN index {index} out of range"))
    }

    /// Opens a zero-balance account with a fresh number and PIN.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::CapacityExceeded`] if the ledger is full.
    pub fn open_account(&self, owner: Owner) -> Result<Arc<Account>, BankError> {
        let mut rng = self.allocator.lock();
        let number = self.next_number(&mut rng)?;
        let pin = Self::next_pin(&mut rng);
        let account = Arc::new(Account::new(number, owner, pin));

        if !self.insert(Arc::clone(&account)) {
            unreachable!("account {number} was free under the allocator lock");
        }

        info!(
            account = %number,
            tax_id = %account.owner().tax_id(),
            "account opened"
        );
        Ok(account)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
