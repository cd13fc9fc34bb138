//! holonotes store - ledger substrate
//!
//! The [`RecordStore`] call contract every client talks to, the scoped
//! signal subscription, the integrity rules and an in-memory ledger that
//! several agents can share.

pub mod memory;
pub mod record_store;
pub mod subscription;
pub mod validation;

pub use memory::{InMemoryLedger, LedgerCell, DEFAULT_SIGNAL_CAPACITY};
pub use record_store::RecordStore;
pub use subscription::{SignalRecv, SignalSubscription};
pub use validation::{validate_create_profile, validate_delete, validate_update};
