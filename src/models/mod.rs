mod commission;
mod withdrawal;

use serde::{Deserialize, Serialize};

pub use commission::CommissionRecord;
pub use withdrawal::{ReservedSlice, Withdrawal, WithdrawalTransaction};

/// Lifecycle of a commission document. Only `Paid` records contribute to the
/// withdrawable balance; `Reserved` marks the derived debit entries created at
/// withdrawal time. The remaining states belong to administrative flows that
/// read and write the same documents.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
    Reserved,
    Processed,
    Withdrawn
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed
}
