use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CommissionStatus;
use crate::types::{AffiliatorId, CommissionId, Monetary, WithdrawalId};

/// A single commission document.
///
/// Two kinds of record share this shape: original earned commissions
/// (credited when an order is paid) and derived `Reserved` entries carved out
/// of a parent commission to back a withdrawal. Original records are mutated
/// only by incrementing `used_amount`; reserved records are never mutated and
/// persist as the audit trail of which commissions funded which withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub commission_id: CommissionId,
    pub affiliator_id: AffiliatorId,
    /// Originating order, absent on derived reserved records.
    pub order_id: Option<u64>,
    /// Denormalized product label kept for reporting continuity.
    pub product_name: String,
    pub amount: Monetary,
    pub status: CommissionStatus,
    /// Cumulative portion of `amount` already consumed by withdrawals.
    pub used_amount: Monetary,
    /// Earning date, drives FIFO consumption order.
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Back-reference to the withdrawal that consumed this slice (reserved records only).
    pub withdrawal_id: Option<WithdrawalId>,
    /// Marks a derived ledger entry rather than an original earned commission.
    pub is_partial: bool,
    /// Parent this reserved slice was carved from (reserved records only).
    pub parent_commission_id: Option<CommissionId>,
}

impl CommissionRecord {
    /// Creates an original `Paid` commission with nothing consumed yet.
    pub fn paid(
        commission_id: CommissionId,
        affiliator_id: AffiliatorId,
        amount: Monetary,
        product_name: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            commission_id,
            affiliator_id,
            order_id: None,
            product_name,
            amount,
            status: CommissionStatus::Paid,
            used_amount: Monetary::ZERO,
            date,
            created_at: Utc::now(),
            withdrawal_id: None,
            is_partial: false,
            parent_commission_id: None,
        }
    }

    /// Creates the derived `Reserved` entry backing `take` of a withdrawal,
    /// copying the parent's reporting fields.
    pub fn reserved_from(parent: &CommissionRecord, commission_id: CommissionId, withdrawal_id: WithdrawalId, take: Monetary) -> Self {
        Self {
            commission_id,
            affiliator_id: parent.affiliator_id,
            order_id: None,
            product_name: parent.product_name.clone(),
            amount: take,
            status: CommissionStatus::Reserved,
            used_amount: Monetary::ZERO,
            date: parent.date,
            created_at: parent.created_at,
            withdrawal_id: Some(withdrawal_id),
            is_partial: true,
            parent_commission_id: Some(parent.commission_id),
        }
    }

    /// The balance still available for withdrawal from this record.
    /// A record consumed past its amount contributes nothing.
    pub fn remaining(&self) -> Monetary {
        match self.amount.checked_sub(self.used_amount) {
            Some(remaining) if remaining.is_positive() => remaining,
            _ => Monetary::ZERO,
        }
    }
}
