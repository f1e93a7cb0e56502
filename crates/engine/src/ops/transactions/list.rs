use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::{Expr, Func, LikeExpr, Order},
};

use crate::{
    Category, EngineError, ResultEngine, Transaction, TransactionDetail, TransactionKind,
    transactions, util::string_enum,
};

use super::super::Engine;

/// Largest page size accepted by [`Engine::list_transactions`].
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Filters for listing transactions. Every field is optional.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub division: Option<String>,
    pub category: Option<Category>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

string_enum! {
    /// Column a transaction page is ordered by.
    pub enum SortField("sort field") {
        Date => "date",
        Amount => "amount",
        CreatedAt => "created_at",
        Kind => "kind",
        Category => "category",
        Division => "division",
        Description => "description",
    }
}

impl Default for SortField {
    fn default() -> Self {
        Self::Date
    }
}

impl SortField {
    fn column(self) -> transactions::Column {
        match self {
            Self::Date => transactions::Column::Date,
            Self::Amount => transactions::Column::AmountMinor,
            Self::CreatedAt => transactions::Column::CreatedAt,
            Self::Kind => transactions::Column::Kind,
            Self::Category => transactions::Column::Category,
            Self::Division => transactions::Column::Division,
            Self::Description => transactions::Column::Description,
        }
    }
}

string_enum! {
    pub enum SortOrder("sort order") {
        Asc => "asc",
        Desc => "desc",
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Desc
    }
}

impl From<SortOrder> for Order {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Page request for [`Engine::list_transactions`]. Pages start at 1.
#[derive(Clone, Debug)]
pub struct ListQuery {
    pub filter: TransactionFilter,
    pub page: u64,
    pub limit: u64,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: TransactionFilter::default(),
            page: 1,
            limit: 20,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    /// Number of transactions matching the filter, across all pages.
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub items: Vec<TransactionDetail>,
}

fn validate_list_query(query: &ListQuery) -> ResultEngine<()> {
    if query.page == 0 {
        return Err(EngineError::InvalidInput("page starts at 1".to_string()));
    }
    if query.limit == 0 || query.limit > MAX_PAGE_LIMIT {
        return Err(EngineError::InvalidInput(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    if let (Some(from), Some(to)) = (query.filter.from, query.filter.to)
        && from > to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

/// Escapes `LIKE` wildcards so the search matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(division) = &filter.division {
            self = self.filter(transactions::Column::Division.eq(division.trim()));
        }
        if let Some(category) = filter.category {
            self = self.filter(transactions::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            self = self.filter(
                Expr::expr(Func::lower(Expr::col(transactions::Column::Description)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Date.lte(to));
        }
        self
    }
}

impl Engine {
    /// Lists the owner's transactions matching `query.filter`, one page at a
    /// time.
    ///
    /// Rows tied on the sort field are ordered by id so pages never overlap.
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        query: &ListQuery,
    ) -> ResultEngine<TransactionPage> {
        validate_list_query(query)?;

        let base = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .apply_tx_filters(&query.filter);
        let total = base.clone().count(&self.database).await?;

        let models = base
            .order_by(query.sort.column(), query.order.into())
            .order_by(transactions::Column::Id, query.order.into())
            .offset((query.page - 1).saturating_mul(query.limit))
            .limit(query.limit)
            .all(&self.database)
            .await?;

        let now = self.now();
        let txs = models
            .into_iter()
            .map(|model| Transaction::from_model(model, now))
            .collect::<ResultEngine<Vec<_>>>()?;
        let items = self.load_details(&self.database, txs).await?;

        Ok(TransactionPage {
            total,
            page: query.page,
            limit: query.limit,
            items,
        })
    }

    /// The owner's `limit` most recent transactions by date.
    pub(in crate::ops) async fn recent_transactions(
        &self,
        owner_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<TransactionDetail>> {
        let query = ListQuery {
            limit,
            ..ListQuery::default()
        };
        Ok(self.list_transactions(owner_id, &query).await?.items)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn default_query_is_first_page_of_twenty_newest() {
        let query = ListQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort, SortField::Date);
        assert_eq!(query.order, SortOrder::Desc);
        assert!(validate_list_query(&query).is_ok());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50% off"), "50\\% off");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn rejects_bad_pages_and_ranges() {
        let zero_page = ListQuery {
            page: 0,
            ..ListQuery::default()
        };
        assert!(matches!(
            validate_list_query(&zero_page),
            Err(EngineError::InvalidInput(_))
        ));

        let huge = ListQuery {
            limit: MAX_PAGE_LIMIT + 1,
            ..ListQuery::default()
        };
        assert!(validate_list_query(&huge).is_err());

        let now = Utc::now();
        let mut inverted = ListQuery::default();
        inverted.filter.from = Some(now);
        inverted.filter.to = Some(now - Duration::days(1));
        assert!(validate_list_query(&inverted).is_err());

        let mut same_day = ListQuery::default();
        same_day.filter.from = Some(now);
        same_day.filter.to = Some(now);
        assert!(validate_list_query(&same_day).is_ok());
    }
}
