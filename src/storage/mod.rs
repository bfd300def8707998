mod errors;
mod memory_store;
#[cfg(test)]
mod tests;

use crate::models::{CommissionRecord, Withdrawal, WithdrawalTransaction};
use crate::types::{AffiliatorId, CommissionId, Monetary, WithdrawalId};

pub use errors::StoreError;
pub use memory_store::MemoryStore;

/// Document-store boundary for the three ledger collections: commissions,
/// withdrawals and withdrawal transactions.
///
/// `paid_commissions` must return records sorted oldest-first by earning date;
/// that sort order is the FIFO consumption contract of the reservation loop.
/// `adjust_used_amount` is a conditional single-document update: it re-checks
/// `0 <= used_amount + delta <= amount` against the freshly read document and
/// rejects the write on violation. A negative delta reverts a prior increment
/// during rollback.
pub trait Store: Send + Sync + 'static {
    /// Allocates the next document id. Ids are unique across collections.
    fn next_id(&self) -> u64;
    fn paid_commissions(&self, affiliator_id: AffiliatorId) -> Result<Vec<CommissionRecord>, StoreError>;
    fn insert_commission(&self, record: CommissionRecord) -> Result<(), StoreError>;
    fn remove_commission(&self, commission_id: CommissionId) -> Result<(), StoreError>;
    fn adjust_used_amount(&self, commission_id: CommissionId, delta: Monetary) -> Result<(), StoreError>;
    fn insert_withdrawal(&self, withdrawal: Withdrawal) -> Result<(), StoreError>;
    fn remove_withdrawal(&self, withdrawal_id: WithdrawalId) -> Result<(), StoreError>;
    fn insert_withdrawal_transaction(&self, transaction: WithdrawalTransaction) -> Result<(), StoreError>;
}
