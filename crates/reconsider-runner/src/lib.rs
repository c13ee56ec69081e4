pub mod bootstrap;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod reconsider;
pub mod registry;

pub use bootstrap::ensure_database_and_ledger;
pub use error::{LedgerError, ReconsiderError};
pub use executor::Executor;
pub use ledger::{COMPLETED_FIELD, COMPLETED_INDEX, Ledger};
pub use reconsider::Reconsider;
pub use registry::{Registry, Selection};
