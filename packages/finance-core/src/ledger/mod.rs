//! Ledger persistence.
//!
//! Provides the durable JSON file store and an in-memory store with the same contract.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::types::Ledger;
use crate::Result;

/// Read/write access to the single ledger record.
///
/// `read` creates the record from the initial balance when it does not exist
/// yet. `write` either publishes the whole new state or fails leaving the old
/// state in place.
pub trait LedgerStore {
    fn read(&self) -> Result<Ledger>;
    fn write(&self, ledger: &Ledger) -> Result<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn read(&self) -> Result<Ledger> {
        (**self).read()
    }

    fn write(&self, ledger: &Ledger) -> Result<()> {
        (**self).write(ledger)
    }
}
