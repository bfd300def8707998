mod affiliator_actor;
#[cfg(test)]
mod tests;

pub use affiliator_actor::{AffiliatorActor, LedgerCommand};
