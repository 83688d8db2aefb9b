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

//! # Bank Ledger
//!
//! This library provides an in-memory bank ledger: accounts identified by
//! eight-digit numbers, guarded by four-digit PINs, holding balances in whole
//! cents. The engine handles deposits, withdrawals, transfers, ATM
//! withdrawals with bill breakdown, loose-change deposits, account closure
//! and monthly interest.
//!
//! ## Core Components
//!
//! - [`Engine`]: Use-case layer enforcing funds, closure and transfer rules
//! - [`Ledger`]: Bounded collection of accounts with number allocation
//! - [`Account`]: One customer's identity, PIN and balance
//! - [`money`]: Half-up decimal-to-cents conversion and interest
//! - [`currency`]: Coin parsing and bill dispensing
//! - [`BankError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use bank_ledger_rs::{Engine, Ledger, Owner};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::with_ledger(Ledger::seeded(7));
//! let owner = Owner::new("Ada", "Lovelace", "123456789".parse().unwrap()).unwrap();
//! let account = engine.open_account(owner).unwrap();
//!
//! // Authorize with the generated PIN, then deposit $19.995 (rounds up).
//! let account = engine.authorize(account.number(), [account.pin()]).unwrap();
//! assert_eq!(engine.deposit(&account, dec!(19.995)).unwrap(), 2000);
//! ```
//!
//! ## Thread Safety
//!
//! All types are `Send + Sync`. The ledger serializes structural changes,
//! each account guards its own state, and multi-account operations lock in
//! ascending account-number order.

pub mod account;
mod base;
pub mod currency;
mod engine;
pub mod error;
mod ledger;
pub mod money;

pub use account::Account;
pub use base::{AccountNumber, Owner, Pin, TaxId};
pub use engine::{AtmReceipt, ChangeDeposit, Engine, TransferReceipt};
pub use error::{BankError, ErrorKind};
pub use ledger::Ledger;
