//! In-memory ledger store (no persistence).

use super::LedgerStore;
use crate::types::Ledger;
use crate::Result;
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ledger kept in process memory. Useful for tests and embedding.
#[derive(Debug)]
pub struct MemoryStore {
    initial_cash: Decimal,
    ledger: Mutex<Option<Ledger>>,
}

impl MemoryStore {
    /// Create an empty store that initializes with the given cash on first read.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            ledger: Mutex::new(None),
        }
    }

    /// Create a store already holding a ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            initial_cash: ledger.cash,
            ledger: Mutex::new(Some(ledger)),
        }
    }

    /// Current contents without triggering initialization.
    pub fn snapshot(&self) -> Option<Ledger> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Ledger>> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for MemoryStore {
    fn read(&self) -> Result<Ledger> {
        let mut guard = self.lock();
        let ledger = guard.get_or_insert_with(|| Ledger::with_cash(self.initial_cash));
        Ok(ledger.clone())
    }

    fn write(&self, ledger: &Ledger) -> Result<()> {
        *self.lock() = Some(ledger.clone());
        Ok(())
    }
}
