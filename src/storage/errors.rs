use crate::types::{CommissionId, WithdrawalId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Commission [{commission_id}] was not found")]
    CommissionNotFound {
        commission_id: CommissionId
    },
    #[error("Withdrawal [{withdrawal_id}] was not found")]
    WithdrawalNotFound {
        withdrawal_id: WithdrawalId
    },
    #[error("Document [{document_id}] already exists")]
    DuplicateDocument {
        document_id: u64
    },
    #[error("Used amount update for commission [{commission_id}] would leave it outside 0..=amount")]
    UsedAmountConflict {
        commission_id: CommissionId
    },
    #[error("Store rejected the operation: {0}")]
    Unavailable(String)
}
