use std::cmp::min;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::ledger::errors::WithdrawalError;
use crate::models::{CommissionRecord, ReservedSlice, Withdrawal, WithdrawalTransaction};
use crate::notify::NotificationEvent;
use crate::storage::Store;
use crate::types::{AffiliatorId, Monetary};

/// Result of a successful withdrawal: the created document plus the outbound
/// notification events the caller should deliver best-effort.
pub struct WithdrawalOutcome {
    pub withdrawal: Withdrawal,
    pub events: Vec<NotificationEvent>
}

/// Commission ledger over a document store.
///
/// Balance reads and the FIFO reservation loop are plain store operations
/// with no locking of their own; callers must serialize invocations per
/// affiliator (the actor layer does) so the balance check and the
/// `used_amount` writes form one critical section.
pub struct CommissionLedger<S: Store> {
    store: Arc<S>
}

impl<S: Store> CommissionLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Sum of the unconsumed portions of the affiliator's `Paid` commissions,
    /// oldest first. Read-only.
    pub fn withdrawable_balance(&self, affiliator_id: AffiliatorId) -> Result<Monetary, WithdrawalError> {
        let records = self.store.paid_commissions(affiliator_id)
            .map_err(|error| WithdrawalError::persistence(affiliator_id, error))?;

        total_remaining(affiliator_id, &records)
    }

    /// Credits a `Paid` commission to the affiliator.
    pub fn credit(
        &self,
        affiliator_id: AffiliatorId,
        amount: Monetary,
        product_name: String,
        date: DateTime<Utc>,
    ) -> Result<CommissionRecord, WithdrawalError> {
        if !amount.is_positive() {
            return Err(WithdrawalError::InvalidAmount { affiliator_id, amount });
        }

        let record = CommissionRecord::paid(self.store.next_id(), affiliator_id, amount, product_name, date);

        self.store.insert_commission(record.clone())
            .map_err(|error| WithdrawalError::persistence(affiliator_id, error))?;

        Ok(record)
    }

    /// Reserves `amount` of commission value FIFO (oldest earned first) and
    /// creates the withdrawal plus its audit record.
    ///
    /// Validation happens before any mutation; a store failure mid-sequence
    /// rolls every already-applied write back before the error surfaces, so
    /// no partial reservation is ever observable.
    pub fn request_withdrawal(
        &self,
        affiliator_id: AffiliatorId,
        amount: Monetary,
        bank_details: String,
        minimum: Monetary,
    ) -> Result<WithdrawalOutcome, WithdrawalError> {
        if bank_details.trim().is_empty() {
            return Err(WithdrawalError::MissingFields { affiliator_id });
        }

        if !amount.is_positive() {
            return Err(WithdrawalError::InvalidAmount { affiliator_id, amount });
        }

        if amount < minimum {
            return Err(WithdrawalError::BelowMinimum { affiliator_id, amount, minimum });
        }

        let records = self.store.paid_commissions(affiliator_id)
            .map_err(|error| WithdrawalError::persistence(affiliator_id, error))?;
        let available = total_remaining(affiliator_id, &records)?;

        if amount > available {
            return Err(WithdrawalError::InsufficientBalance { affiliator_id, requested: amount, available });
        }

        let withdrawal_id = self.store.next_id();
        let mut applied: Vec<ReservedSlice> = Vec::new();
        let mut remaining_to_cover = amount;

        for record in &records {
            if !remaining_to_cover.is_positive() {
                break;
            }

            let slice_available = record.remaining();

            if !slice_available.is_positive() {
                continue;
            }

            let take = min(remaining_to_cover, slice_available);
            let reserved_commission_id = self.store.next_id();
            let reserved = CommissionRecord::reserved_from(record, reserved_commission_id, withdrawal_id, take);

            if let Err(error) = self.store.insert_commission(reserved) {
                self.rollback(affiliator_id, &applied);
                return Err(WithdrawalError::persistence(affiliator_id, error));
            }

            // Conditional update: the store re-checks used_amount against the
            // fresh document, refusing the increment on conflict.
            if let Err(error) = self.store.adjust_used_amount(record.commission_id, take) {
                if let Err(cleanup_error) = self.store.remove_commission(reserved_commission_id) {
                    warn!("Rollback for affiliator [{affiliator_id}] could not remove reserved commission [{reserved_commission_id}]: {cleanup_error}");
                }

                self.rollback(affiliator_id, &applied);
                return Err(WithdrawalError::persistence(affiliator_id, error));
            }

            applied.push(ReservedSlice {
                commission_id: record.commission_id,
                amount: take,
                reserved_commission_id
            });
            remaining_to_cover -= take;
        }

        if remaining_to_cover.is_positive() {
            let covered = amount.checked_sub(remaining_to_cover).unwrap_or(Monetary::ZERO);
            self.rollback(affiliator_id, &applied);
            return Err(WithdrawalError::InsufficientBalance { affiliator_id, requested: amount, available: covered });
        }

        let withdrawal = Withdrawal::approved(withdrawal_id, affiliator_id, amount, bank_details);

        if let Err(error) = self.store.insert_withdrawal(withdrawal.clone()) {
            self.rollback(affiliator_id, &applied);
            return Err(WithdrawalError::persistence(affiliator_id, error));
        }

        let transaction = WithdrawalTransaction {
            withdrawal_id,
            affiliator_id,
            total_amount: amount,
            reserved_commissions: applied.clone(),
            created_at: Utc::now()
        };

        if let Err(error) = self.store.insert_withdrawal_transaction(transaction) {
            if let Err(cleanup_error) = self.store.remove_withdrawal(withdrawal_id) {
                warn!("Rollback for affiliator [{affiliator_id}] could not remove withdrawal [{withdrawal_id}]: {cleanup_error}");
            }

            self.rollback(affiliator_id, &applied);
            return Err(WithdrawalError::persistence(affiliator_id, error));
        }

        let balance = available.checked_sub(amount)
            .ok_or(WithdrawalError::Overflow { affiliator_id })?;
        let events = vec![
            NotificationEvent::AdminWithdrawalRequested { affiliator_id, withdrawal_id, amount },
            NotificationEvent::AffiliatorWithdrawalApproved { affiliator_id, withdrawal_id, amount },
            NotificationEvent::AffiliatorBalanceUpdated { affiliator_id, balance }
        ];

        Ok(WithdrawalOutcome { withdrawal, events })
    }

    /// Compensating rollback: deletes inserted reserved records and reverts
    /// `used_amount` increments, newest slice first. Failures here are logged;
    /// there is nothing further to fall back to.
    fn rollback(&self, affiliator_id: AffiliatorId, applied: &[ReservedSlice]) {
        for slice in applied.iter().rev() {
            if let Err(error) = self.store.remove_commission(slice.reserved_commission_id) {
                warn!("Rollback for affiliator [{affiliator_id}] could not remove reserved commission [{}]: {error}", slice.reserved_commission_id);
            }

            // slice.amount is positive, so the negation cannot overflow
            let revert = Monetary::from_minor(-slice.amount.minor());

            if let Err(error) = self.store.adjust_used_amount(slice.commission_id, revert) {
                warn!("Rollback for affiliator [{affiliator_id}] could not revert used amount on commission [{}]: {error}", slice.commission_id);
            }
        }
    }
}

fn total_remaining(affiliator_id: AffiliatorId, records: &[CommissionRecord]) -> Result<Monetary, WithdrawalError> {
    let mut total = Monetary::ZERO;

    for record in records {
        total = total.checked_add(record.remaining())
            .ok_or(WithdrawalError::Overflow { affiliator_id })?;
    }

    Ok(total)
}
