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

//! Decimal amounts and integer minor units.
//!
//! Stored balances are always whole cents ([`Cents`]). Decimal amounts coming
//! from the outside are converted with half-up rounding on exact decimals,
//! never through binary floating point, so `19.995` becomes `2000` cents.

use crate::BankError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Amount in minor currency units (cents).
pub type Cents = i64;

const CENTS_PER_DOLLAR: Decimal = dec!(100);

/// Percent-per-year to fraction-per-month divisor (100 × 12).
const MONTHLY_RATE_DIVISOR: Decimal = dec!(1200);

/// Converts a decimal dollar amount to cents, rounding half away from zero.
///
/// # Errors
///
/// Returns [`BankError::AmountOutOfRange`] if the result does not fit in
/// [`Cents`].
///
/// # Example
///
/// ```
/// use bank_ledger_rs::money::to_minor_units;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(to_minor_units(dec!(19.995)), Ok(2000));
/// assert_eq!(to_minor_units(dec!(10.004)), Ok(1000));
/// ```
pub fn to_minor_units(amount: Decimal) -> Result<Cents, BankError> {
    amount
        .checked_mul(CENTS_PER_DOLLAR)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or(BankError::AmountOutOfRange)
}

/// Converts cents back to an exact two-decimal dollar amount.
pub fn to_major_units(cents: Cents) -> Decimal {
    Decimal::new(cents, 2)
}

/// Parses a user-entered dollar amount such as `19.99` or `$1,000`.
///
/// A leading `$` and comma group separators are accepted. The value must be
/// strictly positive.
///
/// # Errors
///
/// Returns [`BankError::InvalidAmount`] if the text is not a number or is
/// not greater than zero.
pub fn parse_amount(text: &str) -> Result<Decimal, BankError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let amount = Decimal::from_str(&trimmed.replace(',', ""))
        .map_err(|_| BankError::InvalidAmount)?;
    if amount <= Decimal::ZERO {
        return Err(BankError::InvalidAmount);
    }
    Ok(amount)
}

/// Parses an annual percentage rate such as `3.6`. Zero is allowed.
///
/// # Errors
///
/// Returns [`BankError::InvalidRate`] for non-numeric or negative input.
pub fn parse_rate(text: &str) -> Result<Decimal, BankError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let rate = Decimal::from_str(trimmed).map_err(|_| BankError::InvalidRate)?;
    if rate < Decimal::ZERO {
        return Err(BankError::InvalidRate);
    }
    Ok(rate)
}

/// Computes one month of interest on `balance` at `annual_rate` percent.
///
/// The dollar interest is rounded half-up to the cent first and that rounded
/// amount is then converted to cents. Non-positive balances earn nothing.
///
/// # Errors
///
/// - [`BankError::InvalidRate`] if `annual_rate` is negative.
/// - [`BankError::AmountOutOfRange`] if the product overflows.
///
/// # Example
///
/// ```
/// use bank_ledger_rs::money::monthly_interest;
/// use rust_decimal_macros::dec;
///
/// // $1,000.00 at 3.6% APR: 0.3% per month.
/// assert_eq!(monthly_interest(100_000, dec!(3.6)), Ok(300));
/// ```
pub fn monthly_interest(balance: Cents, annual_rate: Decimal) -> Result<Cents, BankError> {
    if annual_rate < Decimal::ZERO {
        return Err(BankError::InvalidRate);
    }
    if balance <= 0 {
        return Ok(0);
    }
    let monthly_rate = annual_rate / MONTHLY_RATE_DIVISOR;
    let interest = to_major_units(balance)
        .checked_mul(monthly_rate)
        .ok_or(BankError::AmountOutOfRange)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    to_minor_units(interest)
}

/// Formats cents as `$D,DDD.CC`; negative amounts render as `-$D.CC`.
///
/// # Example
///
/// ```
/// use bank_ledger_rs::money::format_cents;
///
/// assert_eq!(format_cents(123_456_789), "$1,234,567.89");
/// assert_eq!(format_cents(5), "$0.05");
/// ```
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    let dollars = (magnitude / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{:02}", magnitude % 100)
}
