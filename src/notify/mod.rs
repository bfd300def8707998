
use crate::types::{AffiliatorId, Monetary, WithdrawalId};
use thiserror::Error;
use tracing::info;

/// Outbound events produced by a successful withdrawal.
///
/// The ledger returns these alongside its result instead of delivering them
/// inline; the actor hands them to a `NotificationSink` after the reservation
/// has committed, so delivery can never roll back or fail the withdrawal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NotificationEvent {
    AdminWithdrawalRequested {
        affiliator_id: AffiliatorId,
        withdrawal_id: WithdrawalId,
        amount: Monetary
    },
    AffiliatorWithdrawalApproved {
        affiliator_id: AffiliatorId,
        withdrawal_id: WithdrawalId,
        amount: Monetary
    },
    AffiliatorBalanceUpdated {
        affiliator_id: AffiliatorId,
        balance: Monetary
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel rejected the event: {0}")]
    Channel(String)
}

/// Delivery boundary for outbound notifications. Implementations may push to
/// a real dispatcher; failures are logged by the caller and never propagated.
pub trait NotificationSink: Send + Sync + 'static {
    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Default sink: writes each event to the log stream.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        match event {
            NotificationEvent::AdminWithdrawalRequested { affiliator_id, withdrawal_id, amount } => {
                info!("Admin notification: affiliator [{affiliator_id}] requested withdrawal [{withdrawal_id}] of {amount}");
            }
            NotificationEvent::AffiliatorWithdrawalApproved { affiliator_id, withdrawal_id, amount } => {
                info!("Affiliator [{affiliator_id}] notification: withdrawal [{withdrawal_id}] of {amount} approved");
            }
            NotificationEvent::AffiliatorBalanceUpdated { affiliator_id, balance } => {
                info!("Affiliator [{affiliator_id}] notification: withdrawable balance is now {balance}");
            }
        }

        Ok(())
    }
}
