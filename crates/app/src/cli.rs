use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use engine::{
    AccountKind, Category, Currency, Money, PaymentMethod, SortField, SortOrder, Timeframe,
    TransactionKind,
};

#[derive(Parser, Debug)]
#[command(name = "fintrack")]
#[command(about = "Personal finance ledger: accounts, transactions and rollups")]
pub struct Cli {
    /// Optional config file path (TOML), defaults to `fintrack.toml`.
    #[arg(long)]
    pub config: Option<String>,

    /// Owner every command acts on.
    #[arg(long, env = "FINTRACK_OWNER")]
    pub owner: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage accounts.
    Account(Account),
    /// Record and browse transactions.
    Tx(Tx),
    /// Read-only rollups.
    Stats(Stats),
}

#[derive(Args, Debug)]
pub struct Account {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Create(AccountCreateArgs),
    /// Active accounts, most recent first.
    List,
    Show {
        id: Uuid,
    },
    Update(AccountUpdateArgs),
    Deactivate {
        id: Uuid,
    },
    NetWorth,
}

#[derive(Args, Debug)]
pub struct AccountCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "bank")]
    pub kind: AccountKind,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub balance: Money,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long, default_value = Currency::DEFAULT_CODE)]
    pub currency: Currency,
}

#[derive(Args, Debug)]
pub struct AccountUpdateArgs {
    pub id: Uuid,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub kind: Option<AccountKind>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub currency: Option<Currency>,
}

#[derive(Args, Debug)]
pub struct Tx {
    #[command(subcommand)]
    pub command: TxCommand,
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    Create(TxCreateArgs),
    Update(TxUpdateArgs),
    Delete { id: Uuid },
    List(TxListArgs),
    Show { id: Uuid },
}

#[derive(Args, Debug)]
pub struct TxCreateArgs {
    #[arg(long)]
    pub kind: TransactionKind,
    #[arg(long, value_parser = Money::parse_positive)]
    pub amount: Money,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value = "personal")]
    pub division: String,
    #[arg(long, default_value = "other")]
    pub category: Category,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (defaults to now).
    #[arg(long, value_parser = parse_start)]
    pub date: Option<DateTime<Utc>>,
    /// Source account (defaults to the most recent active account).
    #[arg(long)]
    pub account: Option<Uuid>,
    /// Destination account, transfers only.
    #[arg(long)]
    pub to: Option<Uuid>,
    #[arg(long, default_value = "cash")]
    pub payment_method: PaymentMethod,
    #[arg(long)]
    pub recurring: bool,
    /// Attachment URL, repeatable.
    #[arg(long = "attachment")]
    pub attachments: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TxUpdateArgs {
    pub id: Uuid,
    #[arg(long)]
    pub kind: Option<TransactionKind>,
    #[arg(long, value_parser = Money::parse_positive)]
    pub amount: Option<Money>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub division: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long, value_parser = parse_start)]
    pub date: Option<DateTime<Utc>>,
    #[arg(long)]
    pub account: Option<Uuid>,
    #[arg(long)]
    pub to: Option<Uuid>,
    #[arg(long)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Args, Debug)]
pub struct TxListArgs {
    #[arg(long)]
    pub kind: Option<TransactionKind>,
    #[arg(long)]
    pub division: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    /// Case-insensitive match on the description.
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, value_parser = parse_start)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive; a bare date covers the whole day.
    #[arg(long, value_parser = parse_end)]
    pub to: Option<DateTime<Utc>>,
    #[arg(long, default_value_t = 1)]
    pub page: u64,
    #[arg(long, default_value_t = 20)]
    pub limit: u64,
    #[arg(long, default_value = "date")]
    pub sort: SortField,
    #[arg(long, default_value = "desc")]
    pub order: SortOrder,
}

#[derive(Args, Debug)]
pub struct Stats {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Income and expense totals per time bucket.
    Dashboard {
        #[arg(long, default_value = "monthly")]
        timeframe: Timeframe,
        #[arg(long)]
        division: Option<String>,
        #[arg(long)]
        all_divisions: bool,
    },
    /// Totals per category, largest first.
    Categories {
        #[arg(long)]
        division: Option<String>,
        #[arg(long, value_parser = parse_start)]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_end)]
        to: Option<DateTime<Utc>>,
    },
    /// Accounts, recent transactions, totals and net worth.
    Snapshot,
}

fn parse_date(raw: &str, time: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(time).and_utc())
        .map_err(|_| format!("invalid date {raw:?}: expected RFC 3339 or YYYY-MM-DD"))
}

/// Bare dates start at midnight UTC.
fn parse_start(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw, NaiveTime::MIN)
}

/// Bare dates end at the last second of the day.
fn parse_end(raw: &str) -> Result<DateTime<Utc>, String> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    parse_date(raw, end)
}
