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

//! Property-based tests for the ledger engine.
//!
//! These tests verify invariants that should hold for any sequence of
//! valid operations.

use bank_ledger_rs::currency::{BILL_DENOMINATIONS, breakdown, parse_change};
use bank_ledger_rs::money::{format_cents, monthly_interest, to_minor_units};
use bank_ledger_rs::{Account, AccountNumber, BankError, Engine, Ledger, Owner};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive dollar amount with up to 2 decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate a balance in cents.
fn arb_balance() -> impl Strategy<Value = i64> {
    0i64..=1_000_000_000i64
}

/// Generate an annual rate between 0% and 25% with 2 decimal places.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=2_500i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn make_account(number: u32) -> Account {
    let owner = Owner::new("Prop", "Test", "123456789".parse().unwrap()).unwrap();
    Account::new(
        AccountNumber::new(number).unwrap(),
        owner,
        "1234".parse().unwrap(),
    )
}

fn open_pair(engine: &Engine, a_cents: i64, b_cents: i64) -> (Arc<Account>, Arc<Account>) {
    let owner = Owner::new("Prop", "Test", "123456789".parse().unwrap()).unwrap();
    let a = engine.open_account(owner.clone()).unwrap();
    let b = engine.open_account(owner).unwrap();
    a.deposit(a_cents);
    b.deposit(b_cents);
    (a, b)
}

// =============================================================================
// Account Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Depositing then withdrawing the same amount restores the balance.
    #[test]
    fn deposit_withdraw_round_trip(start in arb_balance(), amount in 0i64..=1_000_000_000i64) {
        let account = make_account(12_345_678);
        account.deposit(start);
        let before = account.balance();

        account.deposit(amount);
        account.withdraw(amount);

        prop_assert_eq!(account.balance(), before);
    }

    /// Engine withdrawals never drive a balance negative.
    #[test]
    fn engine_withdrawals_never_overdraw(
        deposits in prop::collection::vec(arb_amount(), 1..5),
        withdrawals in prop::collection::vec(arb_amount(), 0..8),
    ) {
        let engine = Engine::with_ledger(Ledger::seeded(1));
        let (account, _) = open_pair(&engine, 0, 0);

        for amount in deposits {
            engine.deposit(&account, amount).unwrap();
        }
        for amount in withdrawals {
            // May fail, that's ok
            let _ = engine.withdraw(&account, amount);
        }

        prop_assert!(account.balance() >= 0);
    }
}

// =============================================================================
// Money Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Whole-cent amounts convert exactly.
    #[test]
    fn to_minor_units_is_exact_on_whole_cents(cents in -1_000_000_000i64..=1_000_000_000i64) {
        prop_assert_eq!(to_minor_units(Decimal::new(cents, 2)), Ok(cents));
    }

    /// A trailing 5 in the third decimal place always rounds up in magnitude.
    #[test]
    fn to_minor_units_rounds_midpoints_up(cents in 0i64..=1_000_000_000i64) {
        let midpoint = Decimal::new(cents * 10 + 5, 3);
        prop_assert_eq!(to_minor_units(midpoint), Ok(cents + 1));
        prop_assert_eq!(to_minor_units(-midpoint), Ok(-(cents + 1)));
    }

    /// Anything below the midpoint rounds down.
    #[test]
    fn to_minor_units_rounds_below_midpoint_down(cents in 0i64..=1_000_000_000i64, tail in 0i64..=4) {
        let value = Decimal::new(cents * 10 + tail, 3);
        prop_assert_eq!(to_minor_units(value), Ok(cents));
    }

    /// Interest is never negative and never more than the balance at 25% APR.
    #[test]
    fn interest_is_bounded(balance in arb_balance(), rate in arb_rate()) {
        let interest = monthly_interest(balance, rate).unwrap();
        prop_assert!(interest >= 0);
        prop_assert!(interest <= balance / 48 + 1);
    }

    /// Formatting keeps the cents and strips nothing but grouping.
    #[test]
    fn format_cents_round_trips_through_digits(cents in 0i64..=i64::MAX) {
        let formatted = format_cents(cents);
        prop_assert!(formatted.starts_with('$'));
        let digits: String = formatted.chars().filter(char::is_ascii_digit).collect();
        let expected = format!("{}{:02}", cents / 100, cents % 100);
        prop_assert_eq!(digits, expected);
    }
}

// =============================================================================
// Currency Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Greedy breakdown with a $1 bill always covers the amount exactly.
    #[test]
    fn bill_breakdown_covers_amount(amount in 0u64..=1_000_000u64) {
        let bills = breakdown(amount, &BILL_DENOMINATIONS);
        prop_assert_eq!(bills.total(), amount);
        prop_assert_eq!(bills.remainder, 0);
        // Largest first, each used at most as often as greedy allows.
        prop_assert!(bills.dispensed.windows(2).all(|w| w[0].0 > w[1].0));
        prop_assert!(bills.quantity(20) <= 2);
        prop_assert!(bills.quantity(10) <= 1);
        prop_assert!(bills.quantity(5) <= 1);
        prop_assert!(bills.quantity(1) <= 4);
    }

    /// Coin descriptions total to the weighted sum of their quantities.
    #[test]
    fn coin_totals_are_weighted_sums(
        q in 0i64..1000, d in 0i64..1000, n in 0i64..1000, p in 0i64..1000,
        h in 0i64..1000, w in 0i64..1000,
    ) {
        let text = format!("{q}q, {d}D; {n}n {p}P {h}h {w}W");
        let expected = q * 25 + d * 10 + n * 5 + p + h * 50 + w * 100;
        prop_assert_eq!(parse_change(&text), Ok(expected));
    }

    /// Text without digits never deposits anything.
    #[test]
    fn digitless_text_totals_zero(text in "[^0-9]*") {
        prop_assert_eq!(parse_change(&text), Ok(0));
    }
}

// =============================================================================
// Transfer Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Transfers conserve the combined balance, whether they succeed or not.
    #[test]
    fn transfer_conserves_total(
        a_cents in arb_balance(),
        b_cents in arb_balance(),
        amounts in prop::collection::vec(arb_amount(), 1..10),
    ) {
        let engine = Engine::with_ledger(Ledger::seeded(7));
        let (a, b) = open_pair(&engine, a_cents, b_cents);
        let total = a_cents + b_cents;

        for (i, amount) in amounts.into_iter().enumerate() {
            let (from, to) = if i % 2 == 0 { (&a, &b) } else { (&b, &a) };
            let before = (a.balance(), b.balance());
            match engine.transfer(from, to.number(), amount) {
                Ok(_) => {}
                Err(BankError::InsufficientFunds) => {
                    prop_assert_eq!((a.balance(), b.balance()), before);
                }
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
            prop_assert_eq!(a.balance() + b.balance(), total);
            prop_assert!(a.balance() >= 0 && b.balance() >= 0);
        }
    }

    /// Near the top of the cents range, a transfer either completes or fails
    /// without moving anything, and the combined balance never changes.
    #[test]
    fn transfer_conserves_total_near_overflow(
        a_cents in (i64::MAX / 2)..=i64::MAX,
        b_cents in (i64::MAX / 2)..=i64::MAX,
        amounts in prop::collection::vec(1i64..=i64::MAX, 1..10),
    ) {
        let engine = Engine::with_ledger(Ledger::seeded(8));
        let (a, b) = open_pair(&engine, a_cents, b_cents);
        let total = i128::from(a_cents) + i128::from(b_cents);

        for (i, cents) in amounts.into_iter().enumerate() {
            let (from, to) = if i % 2 == 0 { (&a, &b) } else { (&b, &a) };
            let before = (a.balance(), b.balance());
            match engine.transfer(from, to.number(), Decimal::new(cents, 2)) {
                Ok(receipt) => prop_assert_eq!(receipt.amount, cents),
                Err(BankError::InsufficientFunds | BankError::AmountOutOfRange) => {
                    prop_assert_eq!((a.balance(), b.balance()), before);
                }
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
            prop_assert_eq!(i128::from(a.balance()) + i128::from(b.balance()), total);
            prop_assert!(a.balance() >= 0 && b.balance() >= 0);
        }
    }
}
