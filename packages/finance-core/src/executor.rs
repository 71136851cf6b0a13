//! Buy order execution against the ledger.

use crate::ledger::LedgerStore;
use crate::types::{fmt_money, normalize_symbol, Position, Transaction, CASH_SCALE};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a successful buy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fill {
    pub symbol: String,
    pub quantity: u64,
    pub price: Decimal,
    /// Amount deducted from cash
    pub total: Decimal,
    /// Cash balance after the buy
    pub cash: Decimal,
    /// Position after the buy
    pub position: Position,
}

impl Fill {
    /// Human-readable confirmation.
    pub fn message(&self) -> String {
        format!(
            "Bought {} {} for ${}. New cash: ${}",
            self.quantity,
            self.symbol,
            fmt_money(&self.total),
            fmt_money(&self.cash)
        )
    }
}

/// Applies buy orders to a ledger store.
///
/// Each order is a read-modify-write of the whole ledger: the new state is
/// built in memory and published with a single atomic write. Concurrent
/// writers are not serialized.
#[derive(Debug)]
pub struct InvestmentExecutor<S> {
    store: S,
}

impl<S: LedgerStore> InvestmentExecutor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Buy `quantity` units of `symbol` at `price`.
    ///
    /// Rejections ([`Error::InvalidInput`], [`Error::InsufficientFunds`]) leave
    /// the ledger untouched. A failed write is returned as
    /// [`Error::Persistence`] and nothing is reported as bought.
    pub fn execute(
        &self,
        symbol: &str,
        quantity: i64,
        price: Decimal,
        rationale: &str,
    ) -> Result<Fill> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(Error::InvalidInput("Symbol must not be empty.".to_string()));
        }

        let quantity = match u64::try_from(quantity) {
            Ok(q) if q > 0 && price > Decimal::ZERO => q,
            _ => {
                return Err(Error::InvalidInput(
                    "Quantity and price must be positive values.".to_string(),
                ))
            }
        };

        let total_cost = Decimal::from(quantity)
            .checked_mul(price)
            .ok_or_else(|| Error::InvalidInput("Order value is out of range.".to_string()))?;

        let mut ledger = self.store.read()?;

        if total_cost > ledger.cash {
            tracing::info!(
                symbol = %symbol,
                needed = %total_cost,
                available = %ledger.cash,
                "Rejected buy: insufficient cash"
            );
            return Err(Error::InsufficientFunds {
                needed: total_cost,
                available: ledger.cash,
            });
        }

        // Average from the unrounded history cost when the history covers the
        // whole position, so avg_price always matches the transaction log.
        let out_of_range = || Error::InvalidInput("Order quantity is out of range.".to_string());
        let previous = ledger.positions.get(&symbol).copied().unwrap_or_default();
        let quantity_after = previous.quantity.checked_add(quantity).ok_or_else(out_of_range)?;
        let position = match ledger.recorded_cost(&symbol) {
            Some((recorded_quantity, recorded_cost)) if recorded_quantity == previous.quantity => {
                let cost = recorded_cost.checked_add(total_cost).ok_or_else(out_of_range)?;
                Position::from_cost(quantity_after, cost)
            }
            _ => previous.checked_buy(quantity, price).ok_or_else(out_of_range)?,
        };

        ledger.cash = (ledger.cash - total_cost).round_dp(CASH_SCALE);
        ledger.positions.insert(symbol.clone(), position);

        let transaction = Transaction::buy(&symbol, quantity, price, rationale);
        ledger.transactions.push(transaction);

        self.store.write(&ledger)?;

        let fill = Fill {
            symbol,
            quantity,
            price,
            total: total_cost.round_dp(CASH_SCALE),
            cash: ledger.cash,
            position,
        };
        tracing::info!(
            symbol = %fill.symbol,
            quantity = fill.quantity,
            price = %fill.price,
            cash = %fill.cash,
            "Executed buy"
        );
        Ok(fill)
    }
}
