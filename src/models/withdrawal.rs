use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::WithdrawalStatus;
use crate::types::{AffiliatorId, CommissionId, Monetary, WithdrawalId};

/// A withdrawal request document.
///
/// Immutable after creation except for `status`, `processed_at` and
/// `rejection_reason`, which administrative flows outside this engine may
/// update later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub withdrawal_id: WithdrawalId,
    pub affiliator_id: AffiliatorId,
    pub amount: Monetary,
    /// Opaque payout destination payload, never interpreted by the ledger.
    pub bank_details: String,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl Withdrawal {
    /// Creates an auto-approved withdrawal. New requests skip the manual
    /// review step and are approved at creation time.
    pub fn approved(withdrawal_id: WithdrawalId, affiliator_id: AffiliatorId, amount: Monetary, bank_details: String) -> Self {
        let now = Utc::now();

        Self {
            withdrawal_id,
            affiliator_id,
            amount,
            bank_details,
            status: WithdrawalStatus::Approved,
            requested_at: now,
            processed_at: Some(now),
            rejection_reason: None,
        }
    }
}

/// One slice of the reservation breakdown: which parent commission was
/// consumed, by how much, and the reserved record that captured it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedSlice {
    pub commission_id: CommissionId,
    pub amount: Monetary,
    pub reserved_commission_id: CommissionId,
}

/// Audit record tying a withdrawal to the full ordered breakdown of the
/// commissions that funded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalTransaction {
    pub withdrawal_id: WithdrawalId,
    pub affiliator_id: AffiliatorId,
    pub total_amount: Monetary,
    pub reserved_commissions: Vec<ReservedSlice>,
    pub created_at: DateTime<Utc>,
}
