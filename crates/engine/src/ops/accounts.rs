use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement,
    TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    Account, AccountPatch, Effect, EngineError, Money, NetWorth, NewAccountCmd, ResultEngine,
    accounts,
    util::{DEFAULT_ACCOUNT_COLOR, normalize_account_name, validate_color},
};

use super::{Engine, with_tx};

/// Maps a unique-index violation on `(owner_id, name)` to `DuplicateName`.
fn map_duplicate_name(err: DbErr, name: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::DuplicateName(name.to_string()),
        _ => err.into(),
    }
}

impl Engine {
    /// Creates an account for `cmd.owner_id`.
    ///
    /// Fails with `DuplicateName` if the owner already has an account (active
    /// or not) with the same name.
    pub async fn create_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let name = normalize_account_name(&cmd.name)?;
        let color = match cmd.color.as_deref() {
            Some(color) => validate_color(color)?,
            None => DEFAULT_ACCOUNT_COLOR.to_string(),
        };
        let account = Account::new(
            cmd.owner_id,
            name,
            cmd.kind,
            cmd.initial_balance,
            color,
            cmd.currency,
            self.now(),
        );
        with_tx!(self, |db_tx| {
            let model = self.insert_account(&db_tx, &account).await?;
            Account::try_from(model)
        })
    }

    /// Lists the owner's active accounts, most recently created first.
    pub async fn list_active_accounts(&self, owner_id: &str) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .filter(accounts::Column::Active.eq(true))
            .order_by_desc(accounts::Column::CreatedAt)
            .order_by_desc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }

    /// Returns an account owned by `owner_id`, active or not.
    pub async fn account(&self, account_id: Uuid, owner_id: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("account".to_string()))?;
        Account::try_from(model)
    }

    /// Merges the supplied fields into an account owned by `owner_id`.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        owner_id: &str,
        patch: AccountPatch,
    ) -> ResultEngine<Account> {
        let name = patch.name.as_deref().map(normalize_account_name).transpose()?;
        let color = patch.color.as_deref().map(validate_color).transpose()?;
        let now = self.now();
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id.to_string())
                .filter(accounts::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("account".to_string()))?;

            let mut active: accounts::ActiveModel = model.clone().into();
            if let Some(name) = name.as_ref().filter(|n| **n != model.name) {
                self.require_name_available(&db_tx, owner_id, name).await?;
                active.name = ActiveValue::Set(name.clone());
            }
            if let Some(kind) = patch.kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            if let Some(currency) = patch.currency {
                active.currency = ActiveValue::Set(currency.code().to_string());
            }
            active.updated_at = ActiveValue::Set(now);

            let updated = active
                .update(&db_tx)
                .await
                .map_err(|err| map_duplicate_name(err, name.as_deref().unwrap_or_default()))?;
            tracing::debug!(owner_id, account_id = %account_id, "account updated");
            Account::try_from(updated)
        })
    }

    /// Soft-deletes an active account. Transactions referencing it are kept.
    pub async fn deactivate_account(&self, account_id: Uuid, owner_id: &str) -> ResultEngine<()> {
        let now = self.now();
        with_tx!(self, |db_tx| {
            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::Active, Expr::value(false))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                .filter(accounts::Column::Id.eq(account_id.to_string()))
                .filter(accounts::Column::OwnerId.eq(owner_id))
                .filter(accounts::Column::Active.eq(true))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound("account".to_string()));
            }
            tracing::debug!(owner_id, account_id = %account_id, "account deactivated");
            Ok(())
        })
    }

    /// Sum of the balances of the owner's active accounts, and their count.
    ///
    /// Balances are summed in minor units with no currency conversion.
    pub async fn net_worth(&self, owner_id: &str) -> ResultEngine<NetWorth> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(balance_minor), 0) AS sum, COUNT(*) AS count \
             FROM accounts WHERE owner_id = ? AND active = ?;",
            vec![owner_id.into(), true.into()],
        );
        let row = self.database.query_one(stmt).await?;
        let total: i64 = row
            .as_ref()
            .and_then(|r| r.try_get("", "sum").ok())
            .unwrap_or(0);
        let count: i64 = row
            .as_ref()
            .and_then(|r| r.try_get("", "count").ok())
            .unwrap_or(0);
        Ok(NetWorth {
            total: Money::new(total),
            account_count: u64::try_from(count).unwrap_or(0),
        })
    }

    pub(super) async fn insert_account(
        &self,
        db: &DatabaseTransaction,
        account: &Account,
    ) -> ResultEngine<accounts::Model> {
        self.require_name_available(db, &account.owner_id, &account.name)
            .await?;
        let model: accounts::ActiveModel = account.into();
        let model = model
            .insert(db)
            .await
            .map_err(|err| map_duplicate_name(err, &account.name))?;
        tracing::debug!(
            owner_id = %account.owner_id,
            account_id = %account.id,
            kind = %account.kind,
            "account created"
        );
        Ok(model)
    }

    async fn require_name_available(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        name: &str,
    ) -> ResultEngine<()> {
        let exists = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .filter(accounts::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Loads an active account owned by `owner_id`, requesting a row lock
    /// where the backend supports one.
    pub(super) async fn find_active_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<Option<accounts::Model>> {
        accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .filter(accounts::Column::Active.eq(true))
            .lock_exclusive()
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// The owner's most recently created active account.
    pub(super) async fn latest_active_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<Option<accounts::Model>> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .filter(accounts::Column::Active.eq(true))
            .order_by_desc(accounts::Column::CreatedAt)
            .order_by_desc(accounts::Column::Id)
            .lock_exclusive()
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Atomically adds `delta` to an account balance.
    ///
    /// Issued as `balance_minor = balance_minor + delta` so concurrent units
    /// never lose an update. No funds check happens here.
    pub(super) async fn apply_delta(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        delta: Money,
    ) -> ResultEngine<()> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::BalanceMinor,
                Expr::col(accounts::Column::BalanceMinor).add(delta.minor()),
            )
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .exec(db)
            .await?;
        if result.rows_affected != 1 {
            return Err(EngineError::NotFound("account".to_string()));
        }
        Ok(())
    }

    pub(super) async fn apply_effects(
        &self,
        db: &DatabaseTransaction,
        effects: &[Effect],
    ) -> ResultEngine<()> {
        for effect in effects {
            self.apply_delta(db, effect.account_id, effect.delta).await?;
        }
        Ok(())
    }
}
