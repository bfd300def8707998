use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::spawn;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

use crate::ledger::{CommissionLedger, WithdrawalError};
use crate::models::{CommissionRecord, Withdrawal};
use crate::notify::NotificationSink;
use crate::storage::Store;
use crate::types::{AffiliatorId, Monetary};

/// Commands accepted by an affiliator's ledger worker. Replies are optional
/// so the CSV ingestion path can fire-and-forget while the API path awaits
/// the result.
pub enum LedgerCommand {
    Credit {
        amount: Monetary,
        product_name: String,
        date: DateTime<Utc>,
        reply: Option<oneshot::Sender<Result<CommissionRecord, WithdrawalError>>>
    },
    Balance {
        reply: oneshot::Sender<Result<Monetary, WithdrawalError>>
    },
    Withdraw {
        amount: Monetary,
        bank_details: String,
        reply: Option<oneshot::Sender<Result<Withdrawal, WithdrawalError>>>
    },
    /// Replies once every previously queued command has been processed.
    Flush {
        reply: oneshot::Sender<()>
    }
}

/// One worker task per affiliator.
///
/// All ledger operations for a partner run on its single task, so the
/// balance check and the reservation writes of a withdrawal can never
/// interleave with another request for the same partner. This is what closes
/// the read-then-write race on `used_amount`.
pub struct AffiliatorActor {
    sender: mpsc::UnboundedSender<LedgerCommand>,
    handle: JoinHandle<()>
}

impl AffiliatorActor {
    pub fn new<S: Store>(
        affiliator_id: AffiliatorId,
        store: Arc<S>,
        minimum_withdrawal: Monetary,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let handle = spawn(async move {
            let ledger = CommissionLedger::new(store);

            while let Some(command) = receiver.recv().await {
                match command {
                    LedgerCommand::Credit { amount, product_name, date, reply } => {
                        let result = ledger.credit(affiliator_id, amount, product_name, date);

                        match &result {
                            Ok(record) => debug!("Commission [{}] of {amount} credited to affiliator [{affiliator_id}]", record.commission_id),
                            Err(error) => warn!("{error}")
                        }

                        if let Some(reply) = reply {
                            let _ = reply.send(result);
                        }
                    }
                    LedgerCommand::Balance { reply } => {
                        let _ = reply.send(ledger.withdrawable_balance(affiliator_id));
                    }
                    LedgerCommand::Withdraw { amount, bank_details, reply } => {
                        let result = match ledger.request_withdrawal(affiliator_id, amount, bank_details, minimum_withdrawal) {
                            Ok(outcome) => {
                                debug!("Withdrawal [{}] of {amount} for affiliator [{affiliator_id}] approved", outcome.withdrawal.withdrawal_id);

                                // Best-effort delivery after the reservation has
                                // committed; a failed notification never fails
                                // the withdrawal.
                                for event in &outcome.events {
                                    if let Err(delivery_error) = sink.deliver(event) {
                                        warn!("Notification delivery failed for affiliator [{affiliator_id}]: {delivery_error}");
                                    }
                                }

                                Ok(outcome.withdrawal)
                            }
                            Err(error) => {
                                match &error {
                                    WithdrawalError::Persistence { source, .. } => {
                                        error!("Withdrawal of {amount} for affiliator [{affiliator_id}] failed in the store: {source}");
                                    }
                                    _ => warn!("{error}")
                                }

                                Err(error)
                            }
                        };

                        if let Some(reply) = reply {
                            let _ = reply.send(result);
                        }
                    }
                    LedgerCommand::Flush { reply } => {
                        let _ = reply.send(());
                    }
                }
            }
        });

        Self { sender, handle }
    }

    /// Queues a command for this affiliator's worker. Returns false if the
    /// worker has already stopped.
    pub fn accept(&self, command: LedgerCommand) -> bool {
        self.sender.send(command).is_ok()
    }

    /// Closes the command channel and waits for the worker to drain its queue.
    pub async fn despawn(self) -> Result<(), JoinError> {
        drop(self.sender);
        self.handle.await
    }
}
