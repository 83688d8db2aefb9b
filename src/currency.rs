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

//! Physical currency: coin parsing and bill dispensing.
//!
//! Two independent denomination tables live here. [`Coin`] values are in
//! cents and drive [`parse_change`]; [`BILL_DENOMINATIONS`] are whole dollars
//! and drive the ATM [`breakdown`].

use crate::BankError;
use crate::money::Cents;
use regex::Regex;
use std::sync::LazyLock;

/// Bills an ATM dispenses, in whole dollars, largest first.
pub const BILL_DENOMINATIONS: [u64; 5] = [50, 20, 10, 5, 1];

/// A coin (or dollar) denomination accepted by [`parse_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coin {
    Penny,
    Nickel,
    Dime,
    Quarter,
    HalfDollar,
    Dollar,
}

impl Coin {
    /// Value in cents.
    pub const fn value(self) -> Cents {
        match self {
            Self::Penny => 1,
            Self::Nickel => 5,
            Self::Dime => 10,
            Self::Quarter => 25,
            Self::HalfDollar => 50,
            Self::Dollar => 100,
        }
    }

    /// Looks up a coin by its letter code, ignoring case.
    ///
    /// `p`, `n`, `d`, `q`, `h` (half-dollar) and `w` (whole dollar).
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_lowercase() {
            'p' => Some(Self::Penny),
            'n' => Some(Self::Nickel),
            'd' => Some(Self::Dime),
            'q' => Some(Self::Quarter),
            'h' => Some(Self::HalfDollar),
            'w' => Some(Self::Dollar),
            _ => None,
        }
    }
}

/// A quantity followed by a coin code, anchored at the scan position.
static COIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+)\s*([pndqhwPNDQHW])\s*").expect("Invalid coin token pattern")
});

/// Totals a free-form description of coins such as `"10q 3d 7n 5p"`.
///
/// Tokens are a quantity followed by a coin code, separated by any mix of
/// whitespace, commas and semicolons. Anything that does not form a token is
/// skipped one character at a time, so stray punctuation or unknown codes
/// never stop later tokens from counting. Empty or unparseable text totals 0.
///
/// # Errors
///
/// Returns [`BankError::AmountOutOfRange`] if a quantity or the total does not
/// fit in [`Cents`].
///
/// # Example
///
/// ```
/// use bank_ledger_rs::currency::parse_change;
///
/// assert_eq!(parse_change("10q 3d 7n 5p"), Ok(320));
/// assert_eq!(parse_change("2Q, ?? 1h"), Ok(100));
/// ```
pub fn parse_change(text: &str) -> Result<Cents, BankError> {
    let text = text.replace([',', ';'], " ");
    let mut total: Cents = 0;
    let mut i = 0;

    while let Some(rest) = text.get(i..).filter(|rest| !rest.is_empty()) {
        let Some(token) = COIN_TOKEN.captures(rest) else {
            i += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        };
        let quantity: Cents = token[1].parse().map_err(|_| BankError::AmountOutOfRange)?;
        let coin = token[2]
            .chars()
            .next()
            .and_then(Coin::from_code)
            .unwrap_or_else(|| unreachable!("pattern only matches coin codes"));
        total = quantity
            .checked_mul(coin.value())
            .and_then(|value| total.checked_add(value))
            .ok_or(BankError::AmountOutOfRange)?;
        i += token[0].len();
    }

    Ok(total)
}

/// Greedy largest-first split of an amount into denominations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Breakdown {
    /// `(denomination, quantity)` pairs, largest denomination first. Only
    /// denominations actually used appear.
    pub dispensed: Vec<(u64, u64)>,
    /// Amount the denominations could not cover.
    pub remainder: u64,
}

impl Breakdown {
    /// Quantity of `denomination` dispensed, 0 if unused.
    pub fn quantity(&self, denomination: u64) -> u64 {
        self.dispensed
            .iter()
            .find(|(value, _)| *value == denomination)
            .map_or(0, |(_, quantity)| *quantity)
    }

    /// Total value dispensed.
    pub fn total(&self) -> u64 {
        self.dispensed
            .iter()
            .map(|(value, quantity)| value * quantity)
            .sum()
    }
}

/// Splits `amount` into `denominations`, taking as many of the largest as
/// possible before moving on.
///
/// Denominations are used largest first whatever order they are given in;
/// zero denominations are ignored.
///
/// # Example
///
/// ```
/// use bank_ledger_rs::currency::{breakdown, BILL_DENOMINATIONS};
///
/// let bills = breakdown(87, &BILL_DENOMINATIONS);
/// assert_eq!(bills.dispensed, vec![(50, 1), (20, 1), (10, 1), (5, 1), (1, 2)]);
/// assert_eq!(bills.remainder, 0);
/// ```
pub fn breakdown(amount: u64, denominations: &[u64]) -> Breakdown {
    let mut ordered: Vec<u64> = denominations.iter().copied().filter(|&d| d > 0).collect();
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    ordered.dedup();

    let mut remaining = amount;
    let mut dispensed = Vec::new();
    for denomination in ordered {
        let quantity = remaining / denomination;
        if quantity > 0 {
            dispensed.push((denomination, quantity));
            remaining -= quantity * denomination;
        }
    }

    Breakdown {
        dispensed,
        remainder: remaining,
    }
}
