use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod accounts;
mod stats;
mod transactions;

pub use stats::{
    CategoryTotal, DashboardSnapshot, RECENT_TRANSACTIONS, StatBucket, StatsQuery, Timeframe,
};
pub use transactions::{
    ListQuery, MAX_PAGE_LIMIT, SortField, SortOrder, TransactionFilter, TransactionPage,
};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The rollback happens when the `DatabaseTransaction` is dropped without
/// being committed, so every `?` inside the block aborts the whole unit.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Source of "now" for timestamps and the editable window.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct Engine {
    database: DatabaseConnection,
    clock: Clock,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Clock>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the clock (defaults to `Utc::now`).
    pub fn clock(mut self, clock: Clock) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            clock: self.clock.unwrap_or_else(|| Arc::new(Utc::now)),
        })
    }
}
