// src/lib.rs
#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod csv;
pub mod error;
pub mod file;
pub mod ledger;
pub mod log;
pub mod merge;
pub mod model;
pub mod progress;
pub mod retry;
pub mod schema;
pub mod table;

pub use error::StoreError;
pub use ledger::{FailureRecord, Ledger, LedgerEntry, RetryOutcome};
pub use model::{Division, Gender, Slot};
pub use table::ResultsTable;
