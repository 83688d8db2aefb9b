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

use bank_ledger_rs::money::{format_cents, parse_amount, parse_rate};
use bank_ledger_rs::{
    Account, AccountNumber, BankError, ChangeDeposit, Engine, Ledger, Owner, Pin, TaxId,
};
use clap::{ArgAction, Parser};
use csv::Writer;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::Level;

/// Bank Ledger - Interactive teller
///
/// Opens accounts and runs deposits, withdrawals, transfers, ATM withdrawals,
/// change deposits, closures and monthly interest from a numbered menu on
/// stdin. Nothing is persisted between runs.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger-rs")]
#[command(about = "An interactive teller for an in-memory bank ledger", long_about = None)]
struct Args {
    /// Maximum number of accounts the bank can hold
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u16).range(1..=100))]
    max_accounts: u16,

    /// Seed for account number and PIN generation (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the account roster as CSV to this file on exit
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let ledger = match args.seed {
        Some(seed) => Ledger::seeded(seed),
        None => Ledger::new(),
    };
    let engine = Engine::with_ledger(ledger.with_capacity(usize::from(args.max_accounts)));

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = Teller::new(&engine, stdin.lock(), stdout.lock()).run() {
        eprintln!("Error during session: {}", e);
        process::exit(1);
    }

    if let Some(path) = &args.export {
        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error creating '{}': {}", path.display(), e);
                process::exit(1);
            }
        };
        if let Err(e) = write_accounts(&engine, file) {
            eprintln!("Error writing export: {}", e);
            process::exit(1);
        }
    }
}

/// Write the account roster to a CSV writer.
///
/// # CSV Format
///
/// Columns: `account, first_name, last_name, tax_id, balance`
///
/// ```csv
/// account,first_name,last_name,tax_id,balance
/// 12345678,Ada,Lovelace,XXX-XX-6789,1999.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in engine.ledger().accounts() {
        wtr.serialize(account.as_ref())?;
    }

    wtr.flush()?;
    Ok(())
}

const MENU: &str = "\
============================================================
What do you want to do?
1. Open an account
2. Get account information and balance
3. Change PIN
4. Deposit money in account
5. Transfer money between accounts
6. Withdraw money from account
7. ATM withdrawal
8. Deposit change
9. Close an account
10. Add monthly interest to all accounts
11. End Program
============================================================";

/// Menu loop and prompts around an [`Engine`].
///
/// Every prompt retries until the input parses, so the engine only ever
/// sees validated values. End of input ends the session.
struct Teller<'a, R, W> {
    engine: &'a Engine,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Teller<'a, R, W> {
    fn new(engine: &'a Engine, input: R, output: W) -> Self {
        Self {
            engine,
            input,
            output,
        }
    }

    fn run(&mut self) -> io::Result<()> {
        match self.menu_loop() {
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(()),
            result => result,
        }
    }

    fn menu_loop(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "{MENU}")?;
            let choice = self.prompt_line("Enter choice: ")?;
            match choice.as_str() {
                "1" => self.open_account()?,
                "2" => self.account_info()?,
                "3" => self.change_pin()?,
                "4" => self.deposit()?,
                "5" => self.transfer()?,
                "6" => self.withdraw()?,
                "7" => self.atm_withdrawal()?,
                "8" => self.deposit_change()?,
                "9" => self.close_account()?,
                "10" => self.monthly_interest()?,
                "11" => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    // === Prompts ===

    /// Reads one trimmed line; end of input is `UnexpectedEof`.
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// Prompts until `parse` accepts the line.
    fn prompt_parsed<T>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, BankError>,
    ) -> io::Result<T> {
        loop {
            let line = self.prompt_line(prompt)?;
            match parse(&line) {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "Invalid input: {e}. Try again.")?,
            }
        }
    }

    fn prompt_non_empty(&mut self, prompt: &str) -> io::Result<String> {
        self.prompt_parsed(prompt, |s| {
            if s.is_empty() {
                Err(BankError::EmptyName)
            } else {
                Ok(s.to_string())
            }
        })
    }

    fn prompt_account_number(&mut self) -> io::Result<AccountNumber> {
        self.prompt_parsed("Enter 8-digit account number: ", |s| s.parse())
    }

    fn prompt_pin(&mut self, prompt: &str) -> io::Result<Pin> {
        self.prompt_parsed(prompt, |s| s.parse())
    }

    fn prompt_amount(&mut self, prompt: &str) -> io::Result<Decimal> {
        self.prompt_parsed(prompt, parse_amount)
    }

    /// Asks for an account number and up to three PINs.
    ///
    /// Returns `None` after reporting why authorization failed.
    fn authorize(&mut self) -> io::Result<Option<Arc<Account>>> {
        let number = self.prompt_account_number()?;
        let engine = self.engine;

        let mut attempt = 0;
        let mut io_error = None;
        let attempts = std::iter::from_fn(|| {
            if attempt > 0 {
                let left = Engine::MAX_PIN_ATTEMPTS - attempt;
                if let Err(e) = writeln!(self.output, "Incorrect PIN. {left} attempt(s) remaining.") {
                    io_error = Some(e);
                    return None;
                }
            }
            attempt += 1;
            match self.prompt_pin("Enter 4-digit PIN: ") {
                Ok(pin) => Some(pin),
                Err(e) => {
                    io_error = Some(e);
                    None
                }
            }
        });
        let result = engine.authorize(number, attempts);

        if let Some(e) = io_error {
            return Err(e);
        }
        match result {
            Ok(account) => Ok(Some(account)),
            Err(BankError::AccountNotFound) => {
                writeln!(self.output, "No account found with that number.\n")?;
                Ok(None)
            }
            Err(e) => {
                writeln!(self.output, "Incorrect PIN. Returning to main menu.\n")?;
                tracing::debug!(error = %e, "authorization ended");
                Ok(None)
            }
        }
    }

    fn report(&mut self, error: &BankError) -> io::Result<()> {
        writeln!(self.output, "Operation failed: {error}.\n")
    }

    // === Menu options ===

    fn open_account(&mut self) -> io::Result<()> {
        if self.engine.ledger().is_full() {
            return writeln!(self.output, "Sorry, the bank is full. Cannot open more accounts.");
        }

        writeln!(self.output, "\n--- Open an Account ---")?;
        let first = self.prompt_non_empty("First name: ")?;
        let last = self.prompt_non_empty("Last name: ")?;
        let tax_id: TaxId =
            self.prompt_parsed("Enter 9-digit SSN (digits only): ", |s| s.parse())?;

        let opened =
            Owner::new(&first, &last, tax_id).and_then(|owner| self.engine.open_account(owner));
        match opened {
            Ok(account) => {
                writeln!(self.output, "\nAccount created successfully!\n")?;
                writeln!(self.output, "{account}")?;
                writeln!(self.output, "\nSave this information securely:")?;
                writeln!(self.output, "  Account Number: {}", account.number())?;
                writeln!(self.output, "  PIN:            {}\n", account.pin())
            }
            Err(e) => self.report(&e),
        }
    }

    fn account_info(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Account Information & Balance ---")?;
        if let Some(account) = self.authorize()? {
            writeln!(self.output, "\nAccount found:\n")?;
            writeln!(self.output, "{account}\n")?;
        }
        Ok(())
    }

    fn change_pin(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Change PIN ---")?;
        let Some(account) = self.authorize()? else {
            return Ok(());
        };

        loop {
            let new_pin = self.prompt_pin("Enter new 4-digit PIN: ")?;
            let confirmation = self.prompt_pin("Re-enter new PIN to confirm: ")?;
            match self.engine.change_pin(&account, new_pin, &confirmation) {
                Ok(()) => return writeln!(self.output, "PIN updated successfully.\n"),
                Err(e @ (BankError::PinUnchanged | BankError::PinMismatch)) => {
                    writeln!(self.output, "{e}. Try again.")?
                }
                Err(e) => return self.report(&e),
            }
        }
    }

    fn deposit(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Deposit Money ---")?;
        let Some(account) = self.authorize()? else {
            return Ok(());
        };
        let amount = self.prompt_amount("Enter amount to deposit (in dollars): $")?;
        match self.engine.deposit(&account, amount) {
            Ok(balance) => writeln!(
                self.output,
                "Deposit successful. New balance: {}\n",
                format_cents(balance)
            ),
            Err(e) => self.report(&e),
        }
    }

    fn transfer(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Transfer Money Between Accounts ---")?;
        writeln!(self.output, "Source account:")?;
        let Some(source) = self.authorize()? else {
            return Ok(());
        };
        writeln!(self.output, "Destination account:")?;
        let destination = self.prompt_account_number()?;
        let amount = self.prompt_amount("Enter transfer amount (in dollars): $")?;

        match self.engine.transfer(&source, destination, amount) {
            Ok(receipt) => {
                writeln!(self.output, "Transfer successful.")?;
                writeln!(
                    self.output,
                    "Source new balance: {}",
                    format_cents(receipt.source_balance)
                )?;
                writeln!(
                    self.output,
                    "Destination new balance: {}\n",
                    format_cents(receipt.destination_balance)
                )
            }
            Err(BankError::InsufficientFunds) => self.insufficient_funds(&source),
            Err(e) => self.report(&e),
        }
    }

    fn withdraw(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Withdraw Money ---")?;
        let Some(account) = self.authorize()? else {
            return Ok(());
        };
        let amount = self.prompt_amount("Enter amount to withdraw (in dollars): $")?;
        match self.engine.withdraw(&account, amount) {
            Ok(balance) => writeln!(
                self.output,
                "Withdrawal successful. New balance: {}\n",
                format_cents(balance)
            ),
            Err(BankError::InsufficientFunds) => self.insufficient_funds(&account),
            Err(e) => self.report(&e),
        }
    }

    fn atm_withdrawal(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- ATM Withdrawal ---")?;
        let Some(account) = self.authorize()? else {
            return Ok(());
        };
        let amount = self.prompt_amount("Enter cash amount to withdraw (whole dollars): $")?;
        match self.engine.atm_withdraw(&account, amount) {
            Ok(receipt) => {
                writeln!(self.output, "Dispensed:")?;
                for (bill, quantity) in &receipt.dispensed.dispensed {
                    writeln!(self.output, "  ${bill}: {quantity}")?;
                }
                writeln!(self.output, "New balance: {}\n", format_cents(receipt.balance))
            }
            Err(BankError::InsufficientFunds) => self.insufficient_funds(&account),
            Err(e) => self.report(&e),
        }
    }

    fn deposit_change(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Deposit Change ---")?;
        let Some(account) = self.authorize()? else {
            return Ok(());
        };
        let coins = self.prompt_line("Enter coins (e.g., '10q 3d 7n 5p', supports p/n/d/q/h/w): ")?;
        match self.engine.deposit_change(&account, &coins) {
            Ok(ChangeDeposit::NothingDeposited) => {
                writeln!(self.output, "No valid coins detected. Nothing deposited.\n")
            }
            Ok(ChangeDeposit::Deposited { amount, balance }) => writeln!(
                self.output,
                "Deposited {} in coins. New balance: {}\n",
                format_cents(amount),
                format_cents(balance)
            ),
            Err(e) => self.report(&e),
        }
    }

    fn close_account(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Close Account ---")?;
        let Some(account) = self.authorize()? else {
            return Ok(());
        };
        match self.engine.close_account(&account) {
            Ok(()) => writeln!(self.output, "Account closed successfully.\n"),
            Err(BankError::NonZeroBalance) => writeln!(
                self.output,
                "Account must have a zero balance to close (current: {}).\n",
                format_cents(account.balance())
            ),
            Err(e) => self.report(&e),
        }
    }

    fn monthly_interest(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Add Monthly Interest to All Accounts ---")?;
        let rate = self.prompt_parsed(
            "Enter ANNUAL interest rate as a percent (e.g., 3.6): ",
            parse_rate,
        )?;
        match self.engine.apply_monthly_interest(rate) {
            Ok(updated) => writeln!(
                self.output,
                "Applied monthly interest at {rate}% APR to {updated} account(s).\n"
            ),
            Err(e) => self.report(&e),
        }
    }

    fn insufficient_funds(&mut self, account: &Account) -> io::Result<()> {
        writeln!(
            self.output,
            "Insufficient funds. Current balance: {}\n",
            format_cents(account.balance())
        )
    }
}
