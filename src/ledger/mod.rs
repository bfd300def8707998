mod commission_ledger;
mod errors;

pub use commission_ledger::{CommissionLedger, WithdrawalOutcome};
pub use errors::WithdrawalError;
