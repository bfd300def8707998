use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use dashmap::DashMap;
use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::error;

use crate::actors::{AffiliatorActor, LedgerCommand};
use crate::ledger::WithdrawalError;
use crate::models::{CommissionRecord, Withdrawal};
use crate::notify::{LogSink, NotificationSink};
use crate::storage::Store;
use crate::types::{AffiliatorId, Monetary};

/// Fallback minimum withdrawal: 10,000 minor units.
pub const DEFAULT_MINIMUM_WITHDRAWAL: Monetary = Monetary::from_minor(10_000);

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Credit,
    Withdraw
}

/// One row of the ledger event CSV. `date` and `product` only apply to
/// credits, `bank` only to withdrawals; the unused columns stay empty.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(rename = "affiliator")]
    pub affiliator_id: AffiliatorId,
    pub amount: Monetary,
    pub date: Option<DateTime<Utc>>,
    pub product: Option<String>,
    pub bank: Option<String>
}

/// Commission ledger engine.
///
/// Routes every operation through a per-affiliator worker so that each
/// partner's balance check and reservation writes execute serially, and
/// drives the CSV ingestion pipeline for the batch surface.
pub struct LedgerEngine<S: Store> {
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    minimum_withdrawal: Monetary,
    actors: DashMap<AffiliatorId, AffiliatorActor>,
    backpressure: usize
}

impl<S: Store> LedgerEngine<S> {
    /// Creates a new engine instance over the provided store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sink: Arc::new(LogSink),
            minimum_withdrawal: DEFAULT_MINIMUM_WITHDRAWAL,
            actors: DashMap::new(),
            backpressure: 256
        }
    }

    pub fn with_minimum_withdrawal(mut self, minimum_withdrawal: Monetary) -> Self {
        self.minimum_withdrawal = minimum_withdrawal;
        self
    }

    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Credits a `Paid` commission to the affiliator. `date` defaults to now.
    pub async fn credit_commission(
        &self,
        affiliator_id: AffiliatorId,
        amount: Monetary,
        product_name: String,
        date: Option<DateTime<Utc>>,
    ) -> Result<CommissionRecord, WithdrawalError> {
        let (reply, response) = oneshot::channel();

        self.dispatch(affiliator_id, LedgerCommand::Credit {
            amount,
            product_name,
            date: date.unwrap_or_else(Utc::now),
            reply: Some(reply)
        })?;

        response.await.map_err(|_| WithdrawalError::WorkerUnavailable { affiliator_id })?
    }

    /// Returns the affiliator's current withdrawable balance.
    pub async fn withdrawable_balance(&self, affiliator_id: AffiliatorId) -> Result<Monetary, WithdrawalError> {
        let (reply, response) = oneshot::channel();

        self.dispatch(affiliator_id, LedgerCommand::Balance { reply })?;

        response.await.map_err(|_| WithdrawalError::WorkerUnavailable { affiliator_id })?
    }

    /// Requests a withdrawal against the affiliator's balance.
    pub async fn request_withdrawal(
        &self,
        affiliator_id: AffiliatorId,
        amount: Monetary,
        bank_details: String,
    ) -> Result<Withdrawal, WithdrawalError> {
        let (reply, response) = oneshot::channel();

        self.dispatch(affiliator_id, LedgerCommand::Withdraw {
            amount,
            bank_details,
            reply: Some(reply)
        })?;

        response.await.map_err(|_| WithdrawalError::WorkerUnavailable { affiliator_id })?
    }

    /// Orchestrates the end-to-end ledger event pipeline for a CSV file.
    /// Returns once every event read from the file has been processed.
    pub async fn run(&self, path: &str) -> anyhow::Result<()> {
        let (sender, receiver) = mpsc::channel::<LedgerEvent>(self.backpressure);
        let csv_handle = self.spawn_csv_reader(path.to_string(), sender);
        let processing_result = self.process_events(receiver).await;

        if let Err(error) = csv_handle.await {
            error!("CSV ingestion failed: {error}");
        }

        processing_result
    }

    /// Closes every worker channel and waits for the queues to drain.
    pub async fn shutdown(self) {
        let despawns = self.actors.into_iter().map(|(_, actor)| actor.despawn());

        for result in join_all(despawns).await {
            if let Err(error) = result {
                error!("An affiliator worker did not despawn gracefully: {error:?}");
            }
        }
    }

    fn dispatch(&self, affiliator_id: AffiliatorId, command: LedgerCommand) -> Result<(), WithdrawalError> {
        let actor = self.actors.entry(affiliator_id).or_insert_with(|| {
            AffiliatorActor::new(affiliator_id, self.store.clone(), self.minimum_withdrawal, self.sink.clone())
        });

        if actor.accept(command) {
            Ok(())
        } else {
            Err(WithdrawalError::WorkerUnavailable { affiliator_id })
        }
    }

    fn spawn_csv_reader(&self, path: String, sender: mpsc::Sender<LedgerEvent>) -> JoinHandle<()> {
        spawn_blocking(move || {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(error) => {
                    error!("Error opening CSV at path: {path} | {error}");
                    return;
                }
            };

            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .flexible(true)
                .from_reader(BufReader::new(file));

            for result in reader.deserialize::<LedgerEvent>() {
                match result {
                    Ok(event) => {
                        if sender.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        error!("CSV deserialization error: {error}");
                    }
                }
            }
        })
    }

    async fn process_events(&self, mut receiver: mpsc::Receiver<LedgerEvent>) -> anyhow::Result<()> {
        let mut touched = HashSet::<AffiliatorId>::new();

        // Partitioning by affiliator keeps strict per-partner ordering while
        // independent partners proceed in parallel.
        while let Some(event) = receiver.recv().await {
            let affiliator_id = event.affiliator_id;
            let command = match event.event_type {
                EventType::Credit => LedgerCommand::Credit {
                    amount: event.amount,
                    product_name: event.product.unwrap_or_else(|| "Unattributed".to_string()),
                    date: event.date.unwrap_or_else(Utc::now),
                    reply: None
                },
                EventType::Withdraw => LedgerCommand::Withdraw {
                    amount: event.amount,
                    bank_details: event.bank.unwrap_or_default(),
                    reply: None
                }
            };

            match self.dispatch(affiliator_id, command) {
                Ok(()) => {
                    touched.insert(affiliator_id);
                }
                Err(error) => {
                    error!("Ledger worker for affiliator [{affiliator_id}] could not accept the event: {error}");
                }
            }
        }

        // Wait for every touched worker to drain its queue so results are
        // visible when run() returns.
        let mut flushes = Vec::new();

        for affiliator_id in touched {
            let (reply, response) = oneshot::channel();

            if self.dispatch(affiliator_id, LedgerCommand::Flush { reply }).is_ok() {
                flushes.push(response);
            }
        }

        for result in join_all(flushes).await {
            if result.is_err() {
                error!("An affiliator worker stopped before flushing its queue");
            }
        }

        Ok(())
    }
}
