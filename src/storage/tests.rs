use super::{MemoryStore, Store, StoreError};
use crate::models::{CommissionRecord, CommissionStatus};
use crate::types::Monetary;
use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use std::str::FromStr;

fn paid_commission(store: &MemoryStore, affiliator_id: u32, amount: &str, day: u32) -> Result<CommissionRecord> {
    let date = Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0)
        .single()
        .ok_or_else(|| anyhow!("invalid fixture date"))?;

    Ok(CommissionRecord::paid(
        store.next_id(),
        affiliator_id,
        Monetary::from_str(amount)?,
        "Sample Product".to_string(),
        date,
    ))
}

#[test]
fn test_paid_commissions_are_sorted_oldest_first() -> Result<()> {
    let store = MemoryStore::new();

    let newer = paid_commission(&store, 1, "20.00", 10)?;
    let older = paid_commission(&store, 1, "10.00", 1)?;
    let newer_id = newer.commission_id;
    let older_id = older.commission_id;

    store.insert_commission(newer)?;
    store.insert_commission(older)?;

    let records = store.paid_commissions(1)?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].commission_id, older_id);
    assert_eq!(records[1].commission_id, newer_id);

    Ok(())
}

#[test]
fn test_paid_commissions_exclude_other_statuses_and_partners() -> Result<()> {
    let store = MemoryStore::new();

    let paid = paid_commission(&store, 1, "10.00", 1)?;
    let mut pending = paid_commission(&store, 1, "20.00", 2)?;
    pending.status = CommissionStatus::Pending;
    let other_partner = paid_commission(&store, 2, "30.00", 3)?;

    store.insert_commission(paid)?;
    store.insert_commission(pending)?;
    store.insert_commission(other_partner)?;

    let records = store.paid_commissions(1)?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, Monetary::from_str("10.00")?);

    Ok(())
}

#[test]
fn test_adjust_used_amount_applies_increments_and_reverts() -> Result<()> {
    let store = MemoryStore::new();
    let commission = paid_commission(&store, 1, "100.00", 1)?;
    let commission_id = commission.commission_id;
    store.insert_commission(commission)?;

    store.adjust_used_amount(commission_id, Monetary::from_str("60.00")?)?;

    let record = store.commission(commission_id).ok_or_else(|| anyhow!("commission missing"))?;
    assert_eq!(record.used_amount, Monetary::from_str("60.00")?);
    assert_eq!(record.remaining(), Monetary::from_str("40.00")?);

    store.adjust_used_amount(commission_id, Monetary::from_str("-60.00")?)?;

    let record = store.commission(commission_id).ok_or_else(|| anyhow!("commission missing"))?;
    assert_eq!(record.used_amount, Monetary::ZERO);

    Ok(())
}

#[test]
fn test_adjust_used_amount_rejects_overconsumption() -> Result<()> {
    let store = MemoryStore::new();
    let commission = paid_commission(&store, 1, "100.00", 1)?;
    let commission_id = commission.commission_id;
    store.insert_commission(commission)?;

    let result = store.adjust_used_amount(commission_id, Monetary::from_str("100.01")?);

    assert!(matches!(result, Err(StoreError::UsedAmountConflict { .. })));

    let record = store.commission(commission_id).ok_or_else(|| anyhow!("commission missing"))?;
    assert_eq!(record.used_amount, Monetary::ZERO);

    Ok(())
}

#[test]
fn test_adjust_used_amount_rejects_negative_result() -> Result<()> {
    let store = MemoryStore::new();
    let commission = paid_commission(&store, 1, "100.00", 1)?;
    let commission_id = commission.commission_id;
    store.insert_commission(commission)?;

    let result = store.adjust_used_amount(commission_id, Monetary::from_str("-0.01")?);

    assert!(matches!(result, Err(StoreError::UsedAmountConflict { .. })));

    Ok(())
}

#[test]
fn test_adjust_used_amount_requires_existing_commission() {
    let store = MemoryStore::new();
    let result = store.adjust_used_amount(99, Monetary::from_minor(1));

    assert!(matches!(result, Err(StoreError::CommissionNotFound { commission_id: 99 })));
}

#[test]
fn test_duplicate_inserts_are_rejected() -> Result<()> {
    let store = MemoryStore::new();
    let commission = paid_commission(&store, 1, "10.00", 1)?;
    let duplicate = commission.clone();

    store.insert_commission(commission)?;
    let result = store.insert_commission(duplicate);

    assert!(matches!(result, Err(StoreError::DuplicateDocument { .. })));

    Ok(())
}

#[test]
fn test_remove_commission_deletes_the_document() -> Result<()> {
    let store = MemoryStore::new();
    let commission = paid_commission(&store, 1, "10.00", 1)?;
    let commission_id = commission.commission_id;
    store.insert_commission(commission)?;

    store.remove_commission(commission_id)?;

    assert!(store.commission(commission_id).is_none());
    assert!(matches!(
        store.remove_commission(commission_id),
        Err(StoreError::CommissionNotFound { .. })
    ));

    Ok(())
}

#[test]
fn test_affiliator_ids_are_sorted_and_deduplicated() -> Result<()> {
    let store = MemoryStore::new();
    store.insert_commission(paid_commission(&store, 3, "10.00", 1)?)?;
    store.insert_commission(paid_commission(&store, 1, "10.00", 2)?)?;
    store.insert_commission(paid_commission(&store, 3, "10.00", 3)?)?;

    assert_eq!(store.affiliator_ids(), vec![1, 3]);

    Ok(())
}
