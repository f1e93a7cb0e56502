//! Read-only rollups over transactions and accounts.
//!
//! Nothing here opens a write unit or touches balances.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use sea_orm::{QueryFilter, Statement, prelude::*};

use crate::{
    Account, Category, EngineError, Money, NetWorth, ResultEngine, TransactionDetail,
    TransactionKind, transactions, util::string_enum,
};

use super::Engine;

/// How many transactions the dashboard snapshot carries.
pub const RECENT_TRANSACTIONS: u64 = 20;

string_enum! {
    pub enum Timeframe("timeframe") {
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::Monthly
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatsQuery {
    pub timeframe: Timeframe,
    /// Only count transactions of this division. Ignored when
    /// `all_divisions` is set.
    pub division: Option<String>,
    /// Count every division and split each bucket by division.
    pub all_divisions: bool,
}

/// Sum of income or expense amounts in one time bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBucket {
    pub year: i32,
    /// Set for monthly buckets.
    pub month: Option<u32>,
    /// Sunday-based week of the year (0..=53), set for weekly buckets.
    pub week: Option<u32>,
    pub kind: TransactionKind,
    pub category: Category,
    pub division: Option<String>,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub kind: TransactionKind,
    pub division: String,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub accounts: Vec<Account>,
    pub recent_transactions: Vec<TransactionDetail>,
    pub total_income: Money,
    pub total_expense: Money,
    pub net_worth: NetWorth,
}

/// Week of the year where weeks start on Sunday. Days before the first
/// Sunday fall in week 0.
pub(crate) fn sunday_week(date: DateTime<Utc>) -> u32 {
    (date.ordinal0() + 7 - date.weekday().num_days_from_sunday()) / 7
}

type BucketKey = (
    i32,
    Option<u32>,
    Option<u32>,
    TransactionKind,
    Category,
    Option<String>,
);

fn bucket_key(
    timeframe: Timeframe,
    with_division: bool,
    kind: TransactionKind,
    category: Category,
    division: &str,
    date: DateTime<Utc>,
) -> BucketKey {
    let (month, week) = match timeframe {
        Timeframe::Weekly => (None, Some(sunday_week(date))),
        Timeframe::Monthly => (Some(date.month()), None),
        Timeframe::Yearly => (None, None),
    };
    let division = with_division.then(|| division.to_string());
    (date.year(), month, week, kind, category, division)
}

impl Engine {
    /// Income and expense totals grouped by time bucket, kind and category.
    ///
    /// Buckets come back ordered by year, month and week ascending.
    pub async fn dashboard_stats(
        &self,
        owner_id: &str,
        query: &StatsQuery,
    ) -> ResultEngine<Vec<StatBucket>> {
        let division = query
            .division
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty() && !query.all_divisions);

        let mut select = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .filter(transactions::Column::Kind.is_in([
                TransactionKind::Income.as_str(),
                TransactionKind::Expense.as_str(),
            ]));
        if let Some(division) = division {
            select = select.filter(transactions::Column::Division.eq(division));
        }
        let models = select.all(&self.database).await?;

        let with_division = query.all_divisions;
        let mut buckets: BTreeMap<BucketKey, Money> = BTreeMap::new();
        for model in models {
            let kind = TransactionKind::try_from(model.kind.as_str())?;
            let category = Category::try_from(model.category.as_str())?;
            let key = bucket_key(
                query.timeframe,
                with_division,
                kind,
                category,
                &model.division,
                model.date,
            );
            *buckets.entry(key).or_default() += Money::new(model.amount_minor);
        }

        Ok(buckets
            .into_iter()
            .map(
                |((year, month, week, kind, category, division), total)| StatBucket {
                    year,
                    month,
                    week,
                    kind,
                    category,
                    division,
                    total,
                },
            )
            .collect())
    }

    /// Totals per (category, kind, division), largest first.
    ///
    /// `from` and `to` are inclusive.
    pub async fn category_summary(
        &self,
        owner_id: &str,
        division: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(EngineError::InvalidInput(
                "invalid range: from must be <= to".to_string(),
            ));
        }

        let mut select =
            transactions::Entity::find().filter(transactions::Column::OwnerId.eq(owner_id));
        if let Some(division) = division.map(str::trim).filter(|d| !d.is_empty()) {
            select = select.filter(transactions::Column::Division.eq(division));
        }
        if let Some(from) = from {
            select = select.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = to {
            select = select.filter(transactions::Column::Date.lte(to));
        }
        let models = select.all(&self.database).await?;

        let mut totals: HashMap<(Category, TransactionKind, String), Money> = HashMap::new();
        for model in models {
            let key = (
                Category::try_from(model.category.as_str())?,
                TransactionKind::try_from(model.kind.as_str())?,
                model.division,
            );
            *totals.entry(key).or_default() += Money::new(model.amount_minor);
        }

        let mut out: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|((category, kind, division), total)| CategoryTotal {
                category,
                kind,
                division,
                total,
            })
            .collect();
        out.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.division.cmp(&b.division))
        });
        Ok(out)
    }

    /// Active accounts, the most recent transactions, lifetime income and
    /// expense totals, and net worth.
    pub async fn dashboard_snapshot(&self, owner_id: &str) -> ResultEngine<DashboardSnapshot> {
        let accounts = self.list_active_accounts(owner_id).await?;
        let recent_transactions = self
            .recent_transactions(owner_id, RECENT_TRANSACTIONS)
            .await?;
        let total_income = self.kind_total(owner_id, TransactionKind::Income).await?;
        let total_expense = self.kind_total(owner_id, TransactionKind::Expense).await?;
        let net_worth = self.net_worth(owner_id).await?;

        Ok(DashboardSnapshot {
            accounts,
            recent_transactions,
            total_income,
            total_expense,
            net_worth,
        })
    }

    async fn kind_total(&self, owner_id: &str, kind: TransactionKind) -> ResultEngine<Money> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum FROM transactions \
             WHERE owner_id = ? AND kind = ?;",
            vec![owner_id.into(), kind.as_str().into()],
        );
        let row = self.database.query_one(stmt).await?;
        let total: i64 = row
            .as_ref()
            .and_then(|r| r.try_get("", "sum").ok())
            .unwrap_or(0);
        Ok(Money::new(total))
    }
}
