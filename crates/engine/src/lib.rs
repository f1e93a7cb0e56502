//! Ledger consistency core.
//!
//! The [`Engine`] keeps per-account balances consistent with the transaction
//! history. Every mutation of a transaction record and the balance effects it
//! implies run inside one database transaction: both become visible together
//! or not at all.
//!
//! Owner identities are resolved by the caller; the engine trusts them and
//! scopes every read and write to the given owner.

pub use accounts::{Account, AccountKind, AccountSnapshot, NetWorth};
pub use commands::{AccountPatch, NewAccountCmd, NewTransactionCmd, TransactionPatch};
pub use currency::Currency;
pub use effects::{Effect, effects, reversal};
pub use error::EngineError;
pub use money::Money;
pub use ops::{
    CategoryTotal, Clock, DashboardSnapshot, Engine, EngineBuilder, ListQuery, MAX_PAGE_LIMIT,
    RECENT_TRANSACTIONS, SortField, SortOrder, StatBucket, StatsQuery, Timeframe,
    TransactionFilter, TransactionPage,
};
pub use transactions::{
    Attachment, Category, EDIT_WINDOW_HOURS, PaymentMethod, Transaction, TransactionDetail,
    TransactionKind, is_editable,
};

mod accounts;
mod commands;
mod currency;
mod effects;
mod error;
mod money;
mod ops;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;

/// Name of the account provisioned when an owner records a transaction
/// without having any active account.
pub const DEFAULT_ACCOUNT_NAME: &str = "Main Wallet";
