use crate::models::{CommissionRecord, CommissionStatus, Withdrawal, WithdrawalTransaction};
use crate::storage::{Store, StoreError};
use crate::types::{AffiliatorId, CommissionId, Monetary, WithdrawalId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory document store backing the three ledger collections.
pub struct MemoryStore {
    commissions: DashMap<CommissionId, CommissionRecord>,
    withdrawals: DashMap<WithdrawalId, Withdrawal>,
    withdrawal_transactions: DashMap<WithdrawalId, WithdrawalTransaction>,
    sequence: AtomicU64
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            commissions: DashMap::new(),
            withdrawals: DashMap::new(),
            withdrawal_transactions: DashMap::new(),
            sequence: AtomicU64::new(1)
        }
    }

    pub fn commission(&self, commission_id: CommissionId) -> Option<CommissionRecord> {
        self.commissions.get(&commission_id).map(|entry| entry.value().clone())
    }

    pub fn commissions_for(&self, affiliator_id: AffiliatorId) -> Vec<CommissionRecord> {
        let mut records: Vec<CommissionRecord> = self.commissions.iter()
            .filter(|entry| entry.value().affiliator_id == affiliator_id)
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by_key(|record| (record.date, record.commission_id));
        records
    }

    pub fn withdrawals_for(&self, affiliator_id: AffiliatorId) -> Vec<Withdrawal> {
        let mut records: Vec<Withdrawal> = self.withdrawals.iter()
            .filter(|entry| entry.value().affiliator_id == affiliator_id)
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by_key(|withdrawal| withdrawal.withdrawal_id);
        records
    }

    pub fn withdrawal_transaction(&self, withdrawal_id: WithdrawalId) -> Option<WithdrawalTransaction> {
        self.withdrawal_transactions.get(&withdrawal_id).map(|entry| entry.value().clone())
    }

    pub fn affiliator_ids(&self) -> Vec<AffiliatorId> {
        let mut ids: Vec<AffiliatorId> = self.commissions.iter()
            .map(|entry| entry.value().affiliator_id)
            .collect();

        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn paid_commissions(&self, affiliator_id: AffiliatorId) -> Result<Vec<CommissionRecord>, StoreError> {
        let mut records: Vec<CommissionRecord> = self.commissions.iter()
            .filter(|entry| {
                let record = entry.value();
                record.affiliator_id == affiliator_id && record.status == CommissionStatus::Paid
            })
            .map(|entry| entry.value().clone())
            .collect();

        // Oldest earning date first; document id breaks ties deterministically.
        records.sort_by_key(|record| (record.date, record.commission_id));

        Ok(records)
    }

    fn insert_commission(&self, record: CommissionRecord) -> Result<(), StoreError> {
        if self.commissions.contains_key(&record.commission_id) {
            return Err(StoreError::DuplicateDocument { document_id: record.commission_id });
        }

        self.commissions.insert(record.commission_id, record);

        Ok(())
    }

    fn remove_commission(&self, commission_id: CommissionId) -> Result<(), StoreError> {
        self.commissions.remove(&commission_id)
            .map(|_| ())
            .ok_or(StoreError::CommissionNotFound { commission_id })
    }

    fn adjust_used_amount(&self, commission_id: CommissionId, delta: Monetary) -> Result<(), StoreError> {
        let mut entry = self.commissions.get_mut(&commission_id)
            .ok_or(StoreError::CommissionNotFound { commission_id })?;

        let record = entry.value_mut();
        let updated = record.used_amount.checked_add(delta)
            .ok_or(StoreError::UsedAmountConflict { commission_id })?;

        if updated.is_negative() || updated > record.amount {
            return Err(StoreError::UsedAmountConflict { commission_id });
        }

        record.used_amount = updated;

        Ok(())
    }

    fn insert_withdrawal(&self, withdrawal: Withdrawal) -> Result<(), StoreError> {
        if self.withdrawals.contains_key(&withdrawal.withdrawal_id) {
            return Err(StoreError::DuplicateDocument { document_id: withdrawal.withdrawal_id });
        }

        self.withdrawals.insert(withdrawal.withdrawal_id, withdrawal);

        Ok(())
    }

    fn remove_withdrawal(&self, withdrawal_id: WithdrawalId) -> Result<(), StoreError> {
        self.withdrawals.remove(&withdrawal_id)
            .map(|_| ())
            .ok_or(StoreError::WithdrawalNotFound { withdrawal_id })
    }

    fn insert_withdrawal_transaction(&self, transaction: WithdrawalTransaction) -> Result<(), StoreError> {
        if self.withdrawal_transactions.contains_key(&transaction.withdrawal_id) {
            return Err(StoreError::DuplicateDocument { document_id: transaction.withdrawal_id });
        }

        self.withdrawal_transactions.insert(transaction.withdrawal_id, transaction);

        Ok(())
    }
}
