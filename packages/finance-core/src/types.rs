//! Core data types for the finance ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decimal places kept for cash balances and transaction totals.
pub const CASH_SCALE: u32 = 2;

/// Decimal places kept for average cost.
pub const AVG_PRICE_SCALE: u32 = 4;

/// Format an amount with exactly two decimals (`1234.5` -> `1234.50`).
pub fn fmt_money(amount: &Decimal) -> String {
    let mut rounded = amount.round_dp(CASH_SCALE);
    rounded.rescale(CASH_SCALE);
    rounded.to_string()
}

/// Format an amount with two decimals and thousands separators (`1234.5` -> `1,234.50`).
pub fn fmt_money_grouped(amount: &Decimal) -> String {
    let plain = fmt_money(amount);
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

/// Normalize a ticker symbol (trimmed, uppercase).
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// An aggregate holding of one symbol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Position {
    /// Number of units held
    pub quantity: u64,
    /// Volume-weighted average cost per unit
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_price: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(quantity: u64, avg_price: Decimal) -> Self {
        Self {
            quantity,
            avg_price,
        }
    }

    /// Calculate the total cost of this position.
    pub fn total_cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.avg_price
    }

    /// Build a position from a quantity and the total paid for it.
    pub fn from_cost(quantity: u64, cost: Decimal) -> Self {
        let avg_price = if quantity > 0 {
            (cost / Decimal::from(quantity)).round_dp(AVG_PRICE_SCALE)
        } else {
            Decimal::ZERO
        };

        Self {
            quantity,
            avg_price,
        }
    }

    /// Apply a buy with cost averaging.
    ///
    /// - New quantity = old quantity + bought quantity
    /// - New avg = (old_quantity * old_avg + quantity * price) / new_quantity
    ///
    /// Returns `None` when the quantity or cost overflows.
    pub fn checked_buy(&self, quantity: u64, price: Decimal) -> Option<Self> {
        let held = Decimal::from(self.quantity).checked_mul(self.avg_price)?;
        let bought = Decimal::from(quantity).checked_mul(price)?;
        Some(Self::from_cost(
            self.quantity.checked_add(quantity)?,
            held.checked_add(bought)?,
        ))
    }
}

/// A single executed purchase. Never modified once appended to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// When the purchase was executed (UTC)
    pub timestamp: DateTime<Utc>,
    /// Stock symbol
    pub symbol: String,
    /// Units bought
    pub quantity: u64,
    /// Price per unit at execution
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// quantity * price
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Why the agent made the trade
    #[serde(default)]
    pub rationale: String,
}

impl Transaction {
    /// Create a new buy transaction stamped with the current time.
    pub fn buy(symbol: &str, quantity: u64, price: Decimal, rationale: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            symbol: normalize_symbol(symbol),
            quantity,
            price,
            total: (Decimal::from(quantity) * price).round_dp(CASH_SCALE),
            rationale: rationale.to_string(),
        }
    }
}

/// The durable record of cash, positions and transaction history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Ledger {
    /// Cash balance
    #[serde(with = "rust_decimal::serde::float")]
    pub cash: Decimal,
    /// Holdings keyed by uppercase symbol
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
    /// Purchase history in execution order
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    /// Create a ledger holding only cash.
    pub fn with_cash(cash: Decimal) -> Self {
        Self {
            cash,
            ..Default::default()
        }
    }

    /// Find a position by symbol (case insensitive).
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(&normalize_symbol(symbol))
    }

    /// Calculate total cost basis of all positions.
    pub fn total_cost(&self) -> Decimal {
        self.positions.values().map(Position::total_cost).sum()
    }

    /// Transactions recorded for one symbol, oldest first.
    pub fn transactions_for<'a>(&'a self, symbol: &str) -> impl Iterator<Item = &'a Transaction> {
        let symbol = normalize_symbol(symbol);
        self.transactions
            .iter()
            .filter(move |tx| tx.symbol == symbol)
    }

    /// Total quantity and unrounded cost of the recorded buys for a symbol, or
    /// `None` if the totals overflow.
    pub fn recorded_cost(&self, symbol: &str) -> Option<(u64, Decimal)> {
        self.transactions_for(symbol)
            .try_fold((0u64, Decimal::ZERO), |(quantity, cost), tx| {
                let tx_cost = Decimal::from(tx.quantity).checked_mul(tx.price)?;
                Some((quantity.checked_add(tx.quantity)?, cost.checked_add(tx_cost)?))
            })
    }

    /// Get the number of positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

/// Normalized price and fundamentals snapshot from one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Quote {
    pub symbol: String,
    pub price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub price_to_earnings: Option<Decimal>,
}

impl Quote {
    /// Create a quote with no fields populated.
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            ..Default::default()
        }
    }

    /// A quote is usable when it carries a positive price.
    pub fn has_price(&self) -> bool {
        self.price.is_some_and(|p| p > Decimal::ZERO)
    }
}

/// API response wrapper used by the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
