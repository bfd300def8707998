use crate::storage::StoreError;
use crate::types::{AffiliatorId, Monetary};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WithdrawalError {
    #[error("Bank details are required for affiliator [{affiliator_id}]")]
    MissingFields {
        affiliator_id: AffiliatorId
    },
    #[error("Amount {amount} for affiliator [{affiliator_id}] must be positive")]
    InvalidAmount {
        affiliator_id: AffiliatorId,
        amount: Monetary
    },
    #[error("Amount {amount} for affiliator [{affiliator_id}] is below the minimum withdrawal of {minimum}")]
    BelowMinimum {
        affiliator_id: AffiliatorId,
        amount: Monetary,
        minimum: Monetary
    },
    #[error("Insufficient balance for affiliator [{affiliator_id}]: requested {requested}, available {available}")]
    InsufficientBalance {
        affiliator_id: AffiliatorId,
        requested: Monetary,
        available: Monetary
    },
    #[error("Numeric overflow while totalling commissions for affiliator [{affiliator_id}]")]
    Overflow {
        affiliator_id: AffiliatorId
    },
    // User-facing message stays generic; the store failure is logged with
    // full context where it is caught.
    #[error("Something went wrong while processing the request")]
    Persistence {
        affiliator_id: AffiliatorId,
        #[source]
        source: StoreError
    },
    #[error("Ledger worker for affiliator [{affiliator_id}] is unavailable")]
    WorkerUnavailable {
        affiliator_id: AffiliatorId
    }
}

impl WithdrawalError {
    pub fn persistence(affiliator_id: AffiliatorId, source: StoreError) -> Self {
        Self::Persistence { affiliator_id, source }
    }
}
