use serde_json::{Value, json};

use engine::{
    AccountPatch, Engine, ListQuery, NewAccountCmd, NewTransactionCmd, StatsQuery,
    TransactionFilter, TransactionPatch,
};

use crate::{
    cli::{
        AccountCommand, AccountCreateArgs, AccountUpdateArgs, Command, StatsCommand,
        TxCommand, TxCreateArgs, TxListArgs, TxUpdateArgs,
    },
    error::{AppError, Result},
};

/// Runs one command for `owner` and returns its JSON output.
pub async fn run(engine: &Engine, owner: &str, command: Command) -> Result<Value> {
    match command {
        Command::Account(account) => run_account(engine, owner, account.command).await,
        Command::Tx(tx) => run_tx(engine, owner, tx.command).await,
        Command::Stats(stats) => run_stats(engine, owner, stats.command).await,
    }
}

async fn run_account(engine: &Engine, owner: &str, command: AccountCommand) -> Result<Value> {
    let out = match command {
        AccountCommand::Create(args) => {
            let account = engine.create_account(new_account(owner, args)).await?;
            tracing::info!(account_id = %account.id, "account created");
            serde_json::to_value(account)?
        }
        AccountCommand::List => serde_json::to_value(engine.list_active_accounts(owner).await?)?,
        AccountCommand::Show { id } => serde_json::to_value(engine.account(id, owner).await?)?,
        AccountCommand::Update(args) => {
            let id = args.id;
            let patch = account_patch(args);
            if patch.is_empty() {
                return Err(AppError::Argument("nothing to update".to_string()));
            }
            serde_json::to_value(engine.update_account(id, owner, patch).await?)?
        }
        AccountCommand::Deactivate { id } => {
            engine.deactivate_account(id, owner).await?;
            json!({ "deactivated": id })
        }
        AccountCommand::NetWorth => serde_json::to_value(engine.net_worth(owner).await?)?,
    };
    Ok(out)
}

fn new_account(owner: &str, args: AccountCreateArgs) -> NewAccountCmd {
    let mut cmd = NewAccountCmd::new(owner, args.name)
        .kind(args.kind)
        .initial_balance(args.balance)
        .currency(args.currency);
    if let Some(color) = args.color {
        cmd = cmd.color(color);
    }
    cmd
}

fn account_patch(args: AccountUpdateArgs) -> AccountPatch {
    AccountPatch {
        name: args.name,
        kind: args.kind,
        color: args.color,
        currency: args.currency,
    }
}

async fn run_tx(engine: &Engine, owner: &str, command: TxCommand) -> Result<Value> {
    let out = match command {
        TxCommand::Create(args) => {
            let detail = engine.create_transaction(new_transaction(owner, args)).await?;
            tracing::info!(transaction_id = %detail.transaction.id, "transaction recorded");
            serde_json::to_value(detail)?
        }
        TxCommand::Update(args) => {
            let id = args.id;
            serde_json::to_value(
                engine
                    .update_transaction(id, owner, transaction_patch(args))
                    .await?,
            )?
        }
        TxCommand::Delete { id } => {
            engine.delete_transaction(id, owner).await?;
            json!({ "deleted": id })
        }
        TxCommand::List(args) => {
            serde_json::to_value(engine.list_transactions(owner, &list_query(args)).await?)?
        }
        TxCommand::Show { id } => serde_json::to_value(engine.transaction(id, owner).await?)?,
    };
    Ok(out)
}

/// The file name of an attachment is the last path segment of its URL.
fn attachment_name(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(url)
}

fn new_transaction(owner: &str, args: TxCreateArgs) -> NewTransactionCmd {
    let mut cmd =
        NewTransactionCmd::new(owner, args.kind, args.division, args.amount, args.description)
            .category(args.category)
            .payment_method(args.payment_method)
            .recurring(args.recurring);
    if let Some(date) = args.date {
        cmd = cmd.date(date);
    }
    if let Some(account) = args.account {
        cmd = cmd.account_id(account);
    }
    if let Some(to) = args.to {
        cmd = cmd.transfer_account_id(to);
    }
    for url in &args.attachments {
        cmd = cmd.attachment(url.as_str(), attachment_name(url));
    }
    cmd
}

fn transaction_patch(args: TxUpdateArgs) -> TransactionPatch {
    TransactionPatch {
        kind: args.kind,
        category: args.category,
        amount: args.amount,
        description: args.description,
        date: args.date,
        account_id: args.account,
        transfer_account_id: args.to,
        payment_method: args.payment_method,
        division: args.division,
    }
}

fn list_query(args: TxListArgs) -> ListQuery {
    ListQuery {
        filter: TransactionFilter {
            kind: args.kind,
            division: args.division,
            category: args.category,
            search: args.search,
            from: args.from,
            to: args.to,
        },
        page: args.page,
        limit: args.limit,
        sort: args.sort,
        order: args.order,
    }
}

async fn run_stats(engine: &Engine, owner: &str, command: StatsCommand) -> Result<Value> {
    let out = match command {
        StatsCommand::Dashboard {
            timeframe,
            division,
            all_divisions,
        } => {
            let query = StatsQuery {
                timeframe,
                division,
                all_divisions,
            };
            serde_json::to_value(engine.dashboard_stats(owner, &query).await?)?
        }
        StatsCommand::Categories { division, from, to } => serde_json::to_value(
            engine
                .category_summary(owner, division.as_deref(), from, to)
                .await?,
        )?,
        StatsCommand::Snapshot => serde_json::to_value(engine.dashboard_snapshot(owner).await?)?,
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use engine::Money;
    use migration::MigratorTrait;
    use sea_orm::Database;

    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    async fn engine() -> Engine {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    async fn exec(engine: &Engine, args: &[&str]) -> Result<Value> {
        let cli = Cli::try_parse_from(
            ["fintrack", "--owner", "alice"]
                .iter()
                .chain(args.iter())
                .copied(),
        )
        .unwrap();
        run(engine, &cli.owner, cli.command).await
    }

    #[test]
    fn attachment_names_come_from_urls() {
        assert_eq!(attachment_name("https://x.example/a/receipt.pdf"), "receipt.pdf");
        assert_eq!(attachment_name("https://x.example/a/"), "a");
        assert_eq!(attachment_name("receipt"), "receipt");
    }

    #[tokio::test]
    async fn account_and_transaction_round_through_cli() {
        let engine = engine().await;

        let account = exec(
            &engine,
            &["account", "create", "--name", "Cash", "--balance", "100"],
        )
        .await
        .unwrap();
        let id = account["id"].as_str().unwrap().to_string();

        let tx = exec(
            &engine,
            &[
                "tx",
                "create",
                "--kind",
                "expense",
                "--amount",
                "30",
                "--description",
                "lunch",
                "--account",
                &id,
            ],
        )
        .await
        .unwrap();
        assert_eq!(tx["transaction"]["editable"], Value::Bool(true));
        assert_eq!(tx["account"]["balance"], json!(Money::new(7000).minor()));

        let worth = exec(&engine, &["account", "net-worth"]).await.unwrap();
        assert_eq!(worth["account_count"], json!(1));

        let err = exec(
            &engine,
            &[
                "tx",
                "create",
                "--kind",
                "expense",
                "--amount",
                "500",
                "--description",
                "tv",
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(engine::EngineError::InsufficientFunds(_))
        ));

        let err = exec(&engine, &["account", "update", &id]).await.unwrap_err();
        assert!(matches!(err, AppError::Argument(_)));
    }
}
