use super::{AffiliatorActor, LedgerCommand};
use crate::models::CommissionStatus;
use crate::notify::LogSink;
use crate::storage::MemoryStore;
use crate::types::{AffiliatorId, Monetary};
use anyhow::Result;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::oneshot;

const MINIMUM: Monetary = Monetary::from_minor(10_000);

fn spawn_actor(affiliator_id: AffiliatorId, store: Arc<MemoryStore>) -> AffiliatorActor {
    AffiliatorActor::new(affiliator_id, store, MINIMUM, Arc::new(LogSink))
}

fn credit_command(amount: &str) -> Result<LedgerCommand> {
    Ok(LedgerCommand::Credit {
        amount: Monetary::from_str(amount)?,
        product_name: "Sample Product".to_string(),
        date: Utc::now(),
        reply: None
    })
}

#[tokio::test]
async fn test_actor_isolation_and_store_persistence() -> Result<()> {
    let store = Arc::new(MemoryStore::new());

    let actor_affiliator_1 = spawn_actor(1, store.clone());
    let actor_affiliator_2 = spawn_actor(2, store.clone());

    actor_affiliator_1.accept(credit_command("500.00")?);
    actor_affiliator_2.accept(credit_command("200.00")?);
    actor_affiliator_1.accept(LedgerCommand::Withdraw {
        amount: Monetary::from_str("150.00")?,
        bank_details: "bank:checking".to_string(),
        reply: None
    });

    actor_affiliator_1.despawn().await?;
    actor_affiliator_2.despawn().await?;

    let balance_1: Monetary = store.commissions_for(1).iter()
        .filter(|record| record.status == CommissionStatus::Paid)
        .fold(Monetary::ZERO, |total, record| total.checked_add(record.remaining()).unwrap_or(total));
    let balance_2: Monetary = store.commissions_for(2).iter()
        .fold(Monetary::ZERO, |total, record| total.checked_add(record.remaining()).unwrap_or(total));

    assert_eq!(balance_1, Monetary::from_str("350.00")?);
    assert_eq!(balance_2, Monetary::from_str("200.00")?);
    assert_eq!(store.withdrawals_for(1).len(), 1);
    assert!(store.withdrawals_for(2).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_actor_replies_over_oneshot_channels() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let actor = spawn_actor(1, store);

    let (credit_reply, credit_response) = oneshot::channel();
    actor.accept(LedgerCommand::Credit {
        amount: Monetary::from_str("500.00")?,
        product_name: "Sample Product".to_string(),
        date: Utc::now(),
        reply: Some(credit_reply)
    });

    let record = credit_response.await??;
    assert_eq!(record.amount, Monetary::from_str("500.00")?);

    let (withdraw_reply, withdraw_response) = oneshot::channel();
    actor.accept(LedgerCommand::Withdraw {
        amount: Monetary::from_str("200.00")?,
        bank_details: "bank:checking".to_string(),
        reply: Some(withdraw_reply)
    });

    let withdrawal = withdraw_response.await??;
    assert_eq!(withdrawal.amount, Monetary::from_str("200.00")?);

    let (balance_reply, balance_response) = oneshot::channel();
    actor.accept(LedgerCommand::Balance { reply: balance_reply });

    assert_eq!(balance_response.await??, Monetary::from_str("300.00")?);

    actor.despawn().await?;

    Ok(())
}

#[tokio::test]
async fn test_actor_maintains_resilience_to_business_rule_errors() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let actor = spawn_actor(1, store.clone());

    // Valid -> Invalid (insufficient balance) -> Valid
    actor.accept(credit_command("300.00")?);
    actor.accept(LedgerCommand::Withdraw {
        amount: Monetary::from_str("999.00")?,
        bank_details: "bank:checking".to_string(),
        reply: None
    });
    actor.accept(LedgerCommand::Withdraw {
        amount: Monetary::from_str("100.00")?,
        bank_details: "bank:checking".to_string(),
        reply: None
    });

    actor.despawn().await?;

    let withdrawals = store.withdrawals_for(1);

    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].amount, Monetary::from_str("100.00")?);

    Ok(())
}

#[tokio::test]
async fn test_flush_waits_for_queued_commands() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let actor = spawn_actor(1, store.clone());

    for _ in 0..10 {
        actor.accept(credit_command("10.00")?);
    }

    let (flush_reply, flush_response) = oneshot::channel();
    actor.accept(LedgerCommand::Flush { reply: flush_reply });
    flush_response.await?;

    assert_eq!(store.commissions_for(1).len(), 10);

    actor.despawn().await?;

    Ok(())
}
