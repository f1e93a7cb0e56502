use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    Category, Engine, EngineError, ListQuery, Money, NewAccountCmd, NewTransactionCmd,
    RECENT_TRANSACTIONS, SortField, SortOrder, StatsQuery, Timeframe, TransactionKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn money(s: &str) -> Money {
    s.parse().unwrap()
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

struct Row {
    kind: TransactionKind,
    division: &'static str,
    category: Category,
    amount: &'static str,
    description: &'static str,
    date: DateTime<Utc>,
}

/// Seeds alice with one funded account and a small, dated history.
async fn seeded() -> (Engine, Uuid) {
    let engine = engine_with_db().await;
    let account = engine
        .create_account(NewAccountCmd::new("alice", "Bank").initial_balance(money("10000")))
        .await
        .unwrap();
    let savings = engine
        .create_account(NewAccountCmd::new("alice", "Savings"))
        .await
        .unwrap();

    let rows = [
        Row {
            kind: TransactionKind::Income,
            division: "office",
            category: Category::Salary,
            amount: "5000",
            description: "January salary",
            date: at(2025, 1, 31),
        },
        Row {
            kind: TransactionKind::Expense,
            division: "personal",
            category: Category::Food,
            amount: "120.50",
            description: "Dinner with friends",
            date: at(2025, 1, 5),
        },
        Row {
            kind: TransactionKind::Expense,
            division: "personal",
            category: Category::Food,
            amount: "30",
            description: "Lunch",
            date: at(2025, 1, 6),
        },
        Row {
            kind: TransactionKind::Expense,
            division: "office",
            category: Category::Fuel,
            amount: "800",
            description: "Fuel for client visit",
            date: at(2025, 2, 10),
        },
        Row {
            kind: TransactionKind::Income,
            division: "personal",
            category: Category::Other,
            amount: "75",
            description: "Sold old DINNER table",
            date: at(2024, 12, 28),
        },
    ];
    for row in rows {
        engine
            .create_transaction(
                NewTransactionCmd::new(
                    "alice",
                    row.kind,
                    row.division,
                    money(row.amount),
                    row.description,
                )
                .category(row.category)
                .date(row.date)
                .account_id(account.id),
            )
            .await
            .unwrap();
    }
    engine
        .create_transaction(
            NewTransactionCmd::new(
                "alice",
                TransactionKind::Transfer,
                "personal",
                money("1000"),
                "Move to savings",
            )
            .category(Category::Transfer)
            .date(at(2025, 1, 15))
            .account_id(account.id)
            .transfer_account_id(savings.id),
        )
        .await
        .unwrap();

    (engine, account.id)
}

#[tokio::test]
async fn list_defaults_to_newest_first() {
    let (engine, _) = seeded().await;

    let page = engine
        .list_transactions("alice", &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.items.len(), 6);
    let dates: Vec<_> = page.items.iter().map(|d| d.transaction.date).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
    assert!(page.items.iter().all(|d| d.account.is_some()));
}

#[tokio::test]
async fn list_filters_combine() {
    let (engine, _) = seeded().await;

    let mut query = ListQuery::default();
    query.filter.kind = Some(TransactionKind::Expense);
    query.filter.division = Some("personal".to_string());
    let page = engine.list_transactions("alice", &query).await.unwrap();
    assert_eq!(page.total, 2);
    assert!(
        page.items
            .iter()
            .all(|d| d.transaction.category == Category::Food)
    );

    let mut query = ListQuery::default();
    query.filter.search = Some("dinner".to_string());
    let page = engine.list_transactions("alice", &query).await.unwrap();
    assert_eq!(page.total, 2);

    let mut query = ListQuery::default();
    query.filter.category = Some(Category::Fuel);
    let page = engine.list_transactions("alice", &query).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].transaction.amount, money("800"));
}

#[tokio::test]
async fn list_date_range_is_inclusive() {
    let (engine, _) = seeded().await;

    let mut query = ListQuery::default();
    query.filter.from = Some(at(2025, 1, 5));
    query.filter.to = Some(at(2025, 1, 31));
    let page = engine.list_transactions("alice", &query).await.unwrap();
    // Both boundary transactions are included, plus the two in between.
    assert_eq!(page.total, 4);

    query.filter.to = Some(at(2025, 1, 31) - Duration::seconds(1));
    let page = engine.list_transactions("alice", &query).await.unwrap();
    assert_eq!(page.total, 3);

    query.filter.from = Some(at(2025, 2, 1));
    let err = engine.list_transactions("alice", &query).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn list_paginates_with_stable_sort() {
    let (engine, _) = seeded().await;

    let query = |page| ListQuery {
        page,
        limit: 4,
        sort: SortField::Amount,
        order: SortOrder::Asc,
        ..ListQuery::default()
    };
    let first = engine.list_transactions("alice", &query(1)).await.unwrap();
    let second = engine.list_transactions("alice", &query(2)).await.unwrap();
    let third = engine.list_transactions("alice", &query(3)).await.unwrap();

    assert_eq!(first.total, 6);
    assert_eq!(first.items.len(), 4);
    assert_eq!(second.items.len(), 2);
    assert!(third.items.is_empty());

    let amounts: Vec<Money> = first
        .items
        .iter()
        .chain(&second.items)
        .map(|d| d.transaction.amount)
        .collect();
    let expected: Vec<Money> = ["30", "75", "120.50", "800", "1000", "5000"]
        .into_iter()
        .map(money)
        .collect();
    assert_eq!(amounts, expected);
}

#[tokio::test]
async fn dashboard_stats_bucket_by_month() {
    let (engine, _) = seeded().await;

    let buckets = engine
        .dashboard_stats("alice", &StatsQuery::default())
        .await
        .unwrap();

    // Transfers are not part of the dashboard.
    assert!(
        buckets
            .iter()
            .all(|b| b.kind != TransactionKind::Transfer)
    );
    let keys: Vec<_> = buckets
        .iter()
        .map(|b| (b.year, b.month, b.kind, b.category, b.total))
        .collect();
    assert_eq!(
        keys,
        vec![
            (
                2024,
                Some(12),
                TransactionKind::Income,
                Category::Other,
                money("75")
            ),
            (
                2025,
                Some(1),
                TransactionKind::Income,
                Category::Salary,
                money("5000")
            ),
            (
                2025,
                Some(1),
                TransactionKind::Expense,
                Category::Food,
                money("150.50")
            ),
            (
                2025,
                Some(2),
                TransactionKind::Expense,
                Category::Fuel,
                money("800")
            ),
        ]
    );
    assert!(buckets.iter().all(|b| b.week.is_none() && b.division.is_none()));
}

#[tokio::test]
async fn dashboard_stats_weekly_and_by_division() {
    let (engine, _) = seeded().await;

    let weekly = StatsQuery {
        timeframe: Timeframe::Weekly,
        division: Some("personal".to_string()),
        all_divisions: false,
    };
    let buckets = engine.dashboard_stats("alice", &weekly).await.unwrap();
    // 2025-01-05 is a Sunday and starts week 1; 2025-01-06 shares it.
    let food: Vec<_> = buckets
        .iter()
        .filter(|b| b.category == Category::Food)
        .collect();
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].week, Some(1));
    assert_eq!(food[0].total, money("150.50"));
    assert!(buckets.iter().all(|b| b.category != Category::Salary));

    let split = StatsQuery {
        timeframe: Timeframe::Yearly,
        division: None,
        all_divisions: true,
    };
    let buckets = engine.dashboard_stats("alice", &split).await.unwrap();
    let income_2025: Vec<_> = buckets
        .iter()
        .filter(|b| b.year == 2025 && b.kind == TransactionKind::Income)
        .collect();
    assert_eq!(income_2025.len(), 1);
    assert_eq!(income_2025[0].division.as_deref(), Some("office"));
    assert!(buckets.iter().all(|b| b.month.is_none() && b.week.is_none()));
}

#[tokio::test]
async fn category_summary_orders_by_total() {
    let (engine, _) = seeded().await;

    let totals = engine
        .category_summary("alice", None, None, None)
        .await
        .unwrap();
    let amounts: Vec<Money> = totals.iter().map(|t| t.total).collect();
    let mut sorted = amounts.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(amounts, sorted);
    assert_eq!(totals[0].category, Category::Salary);

    let personal_january = engine
        .category_summary(
            "alice",
            Some("personal"),
            Some(at(2025, 1, 1)),
            Some(at(2025, 1, 31)),
        )
        .await
        .unwrap();
    let food = personal_january
        .iter()
        .find(|t| t.category == Category::Food)
        .unwrap();
    assert_eq!(food.total, money("150.50"));
    assert_eq!(food.division, "personal");
    assert!(
        personal_january
            .iter()
            .all(|t| t.category != Category::Other)
    );
}

#[tokio::test]
async fn snapshot_combines_accounts_totals_and_recent() {
    let (engine, account_id) = seeded().await;
    for n in 0..RECENT_TRANSACTIONS {
        engine
            .create_transaction(
                NewTransactionCmd::new(
                    "alice",
                    TransactionKind::Expense,
                    "personal",
                    money("1"),
                    format!("coffee {n}"),
                )
                .account_id(account_id),
            )
            .await
            .unwrap();
    }

    let snapshot = engine.dashboard_snapshot("alice").await.unwrap();
    assert_eq!(snapshot.accounts.len(), 2);
    assert_eq!(
        snapshot.recent_transactions.len() as u64,
        RECENT_TRANSACTIONS
    );
    assert!(
        snapshot
            .recent_transactions
            .iter()
            .all(|d| d.transaction.description.starts_with("coffee"))
    );
    assert_eq!(snapshot.total_income, money("5075"));
    assert_eq!(snapshot.total_expense, money("970.50"));
    // 10000 + 5075 - 970.50; the transfer moves money between accounts.
    assert_eq!(snapshot.net_worth.total, money("14104.50"));
    assert_eq!(snapshot.net_worth.account_count, 2);
}

#[tokio::test]
async fn rollups_ignore_other_owners() {
    let (engine, _) = seeded().await;

    assert!(
        engine
            .dashboard_stats("bob", &StatsQuery::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        engine
            .category_summary("bob", None, None, None)
            .await
            .unwrap()
            .is_empty()
    );
    let snapshot = engine.dashboard_snapshot("bob").await.unwrap();
    assert!(snapshot.accounts.is_empty());
    assert!(snapshot.recent_transactions.is_empty());
    assert_eq!(snapshot.total_income, Money::ZERO);
}

#[tokio::test]
async fn all_divisions_wins_over_a_single_division() {
    let engine = engine_with_db().await;
    let account = engine
        .create_account(NewAccountCmd::new("alice", "Bank").initial_balance(money("1000")))
        .await
        .unwrap();
    for division in ["office", "personal"] {
        engine
            .create_transaction(
                NewTransactionCmd::new(
                    "alice",
                    TransactionKind::Expense,
                    division,
                    money("100"),
                    "Groceries",
                )
                .category(Category::Food)
                .date(at(2025, 3, 1))
                .account_id(account.id),
            )
            .await
            .unwrap();
    }

    let query = StatsQuery {
        timeframe: Timeframe::Yearly,
        division: Some("office".to_string()),
        all_divisions: true,
    };
    let mut buckets: Vec<_> = engine
        .dashboard_stats("alice", &query)
        .await
        .unwrap()
        .into_iter()
        .map(|b| (b.division, b.total))
        .collect();
    buckets.sort();
    assert_eq!(
        buckets,
        vec![
            (Some("office".to_string()), money("100")),
            (Some("personal".to_string()), money("100")),
        ]
    );
}

#[tokio::test]
async fn search_matches_wildcards_literally() {
    let engine = engine_with_db().await;
    let account = engine
        .create_account(NewAccountCmd::new("alice", "Bank").initial_balance(money("1000")))
        .await
        .unwrap();
    for description in ["50% off shoes", "500 off coupon", "gift_card top-up", "giftXcard"] {
        engine
            .create_transaction(
                NewTransactionCmd::new(
                    "alice",
                    TransactionKind::Expense,
                    "personal",
                    money("10"),
                    description,
                )
                .account_id(account.id),
            )
            .await
            .unwrap();
    }

    let mut query = ListQuery::default();
    query.filter.search = Some("50%".to_string());
    let page = engine.list_transactions("alice", &query).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].transaction.description, "50% off shoes");

    query.filter.search = Some("GIFT_".to_string());
    let page = engine.list_transactions("alice", &query).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].transaction.description, "gift_card top-up");
}
