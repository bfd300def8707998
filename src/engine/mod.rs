mod ledger_engine;

pub use ledger_engine::{LedgerEngine, DEFAULT_MINIMUM_WITHDRAWAL};
