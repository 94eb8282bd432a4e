// Application layer: use cases over a ledger store.
// Reports take the store explicitly; LedgerService wraps the SQLite
// repository for the CLI and other clients.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
