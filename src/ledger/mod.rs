//! Receipts and ledger entries.
//!
//! There is no real data source yet; the HTTP layer talks to a
//! [`LedgerSource`] and ships with [`EmptyLedger`].

use serde_json::Value;

/// Read access to receipts and accounting entries.
pub trait LedgerSource: Send + Sync {
    fn receipts(&self) -> Vec<Value>;
    fn entries(&self) -> Vec<Value>;
    /// Look up one entry. Ids are opaque; an unknown id is `None`.
    fn entry(&self, id: &str) -> Option<Value>;
}

/// A ledger with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLedger;

impl LedgerSource for EmptyLedger {
    fn receipts(&self) -> Vec<Value> {
        Vec::new()
    }

    fn entries(&self) -> Vec<Value> {
        Vec::new()
    }

    fn entry(&self, _id: &str) -> Option<Value> {
        None
    }
}
