mod errors;
mod monetary;

pub use monetary::Monetary;

pub type AffiliatorId = u32;
pub type CommissionId = u64;
pub type WithdrawalId = u64;
