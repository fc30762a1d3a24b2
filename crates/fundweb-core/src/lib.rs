//! Fund initiative transaction editor
//!
//! Module layout:
//! - `types`: identifiers, statuses, capabilities and the transaction kinds
//! - `models`: initiatives, backers, merchants and transactions
//! - `currency`: exact currency amounts
//! - `query`: lookups the editor depends on
//! - `directory`: in-memory implementation of those lookups
//! - `engine`: the generic validate-then-apply driver and base behaviour
//! - `editor`: initiative-specific transaction handling
//! - `store`: in-memory initiatives and transaction logs
//! - `error`: error types

pub mod currency;
pub mod directory;
pub mod editor;
pub mod engine;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
pub mod types;

pub use currency::{Currency, CurrencyError};
pub use directory::{Directory, Grant};
pub use editor::InitiativeEditor;
pub use engine::{apply_transactions, resolves_to_empty, validate_transactions, EditableObject, TransactionEditor};
pub use error::{
    ApplyError, CoreError, CoreResult, DefaultErrorLogger, EditError, ErrorCode, ErrorContext, ErrorLogger,
    ErrorSeverity, ValidationError,
};
pub use models::{Backer, Initiative, Merchant, Transaction, TransactionValue};
pub use query::{BackerQuery, MerchantQuery};
pub use store::{FundSeed, FundStore, StoreSummary};
pub use types::{Capability, InitiativeStatus, Phid, TransactionType, Viewer};
