use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    Account, AccountKind, Attachment, Currency, DEFAULT_ACCOUNT_NAME, EngineError, Money,
    NewTransactionCmd, ResultEngine, Transaction, TransactionDetail, TransactionKind,
    TransactionPatch, accounts, effects, reversal, transactions,
    util::{DEFAULT_ACCOUNT_COLOR, DESCRIPTION_MAX_CHARS, normalize_required_text},
};

use super::super::{Engine, with_tx};

fn validate_attachments(attachments: &[Attachment]) -> ResultEngine<()> {
    if attachments.iter().any(|a| a.url.trim().is_empty()) {
        return Err(EngineError::InvalidInput(
            "attachment url is required".to_string(),
        ));
    }
    Ok(())
}

fn debits_source(kind: TransactionKind) -> bool {
    matches!(kind, TransactionKind::Expense | TransactionKind::Transfer)
}

impl Engine {
    /// Records a transaction and applies its balance effects in one unit.
    ///
    /// Steps, all inside the same DB transaction:
    /// 1. resolve the source account (given, most recent active, or a freshly
    ///    provisioned default wallet)
    /// 2. for expenses and transfers, reject if the source balance is lower
    ///    than the amount
    /// 3. for transfers, resolve the destination
    /// 4. insert the record and apply the effects
    ///
    /// Every check runs before the first write, and any failure rolls back the
    /// whole unit, including a wallet provisioned in step 1.
    pub async fn create_transaction(
        &self,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<TransactionDetail> {
        cmd.amount.positive()?;
        let division = normalize_required_text(&cmd.division, "division", None)?;
        let description =
            normalize_required_text(&cmd.description, "description", Some(DESCRIPTION_MAX_CHARS))?;
        validate_attachments(&cmd.attachments)?;
        let owner_id = cmd.owner_id.as_str();
        let now = self.now();

        with_tx!(self, |db_tx| {
            let source = self
                .resolve_source_account(&db_tx, owner_id, cmd.account_id, now)
                .await?;
            if debits_source(cmd.kind) && source.balance.minor() < cmd.amount.minor() {
                return Err(EngineError::InsufficientFunds(source.name));
            }

            let transfer_account_id = if cmd.kind == TransactionKind::Transfer {
                Some(
                    self.resolve_destination(&db_tx, owner_id, source.id, cmd.transfer_account_id)
                        .await?,
                )
            } else {
                None
            };

            let tx = Transaction {
                id: Uuid::new_v4(),
                owner_id: owner_id.to_string(),
                kind: cmd.kind,
                division,
                category: cmd.category,
                amount: cmd.amount,
                description,
                date: cmd.date.unwrap_or(now),
                account_id: source.id,
                transfer_account_id,
                payment_method: cmd.payment_method,
                recurring: cmd.recurring,
                attachments: cmd.attachments,
                created_at: now,
                updated_at: now,
                editable: true,
            };
            tx.to_active_model()?.insert(&db_tx).await?;

            let fx = effects(tx.kind, tx.amount, tx.account_id, tx.transfer_account_id)?;
            self.apply_effects(&db_tx, &fx).await?;

            tracing::debug!(
                owner_id,
                transaction_id = %tx.id,
                kind = %tx.kind,
                amount = %tx.amount,
                "transaction created"
            );

            let mut details = self.load_details(&db_tx, vec![tx]).await?;
            details
                .pop()
                .ok_or_else(|| EngineError::NotFound("transaction".to_string()))
        })
    }

    /// Edits a transaction created less than 12 hours ago.
    ///
    /// The old effect is reversed, the patch applied, and the new effect
    /// applied to the (possibly different) accounts, all in one unit.
    ///
    /// No funds check is made here: an edit may leave the source balance
    /// negative.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        owner_id: &str,
        patch: TransactionPatch,
    ) -> ResultEngine<TransactionDetail> {
        if let Some(amount) = patch.amount {
            amount.positive()?;
        }
        let division = patch
            .division
            .as_deref()
            .map(|d| normalize_required_text(d, "division", None))
            .transpose()?;
        let description = patch
            .description
            .as_deref()
            .map(|d| normalize_required_text(d, "description", Some(DESCRIPTION_MAX_CHARS)))
            .transpose()?;
        let now = self.now();

        with_tx!(self, |db_tx| {
            let model = self
                .find_owned_transaction(&db_tx, transaction_id, owner_id)
                .await?;
            let mut tx = Transaction::from_model(model, now)?;
            if !tx.editable {
                return Err(EngineError::Locked(format!(
                    "transaction {transaction_id} was created at {}",
                    tx.created_at
                )));
            }

            let undo = reversal(tx.kind, tx.amount, tx.account_id, tx.transfer_account_id)?;
            self.apply_effects(&db_tx, &undo).await?;

            if let Some(kind) = patch.kind {
                tx.kind = kind;
            }
            if let Some(category) = patch.category {
                tx.category = category;
            }
            if let Some(amount) = patch.amount {
                tx.amount = amount;
            }
            if let Some(description) = description {
                tx.description = description;
            }
            if let Some(date) = patch.date {
                tx.date = date;
            }
            if let Some(method) = patch.payment_method {
                tx.payment_method = method;
            }
            if let Some(division) = division {
                tx.division = division;
            }
            if let Some(account_id) = patch.account_id.filter(|id| *id != tx.account_id) {
                self.find_active_account(&db_tx, owner_id, account_id)
                    .await?
                    .ok_or_else(|| EngineError::NotFound("account".to_string()))?;
                tx.account_id = account_id;
            }
            tx.transfer_account_id = if tx.kind == TransactionKind::Transfer {
                let requested = patch.transfer_account_id.or(tx.transfer_account_id);
                if requested.is_some() && requested == tx.transfer_account_id {
                    // Unchanged destination: only re-check it is not the source.
                    if requested == Some(tx.account_id) {
                        return Err(EngineError::InvalidDestination(
                            "destination must differ from source".to_string(),
                        ));
                    }
                    requested
                } else {
                    Some(
                        self.resolve_destination(&db_tx, owner_id, tx.account_id, requested)
                            .await?,
                    )
                }
            } else {
                None
            };
            tx.updated_at = now;

            let fx = effects(tx.kind, tx.amount, tx.account_id, tx.transfer_account_id)?;
            self.apply_effects(&db_tx, &fx).await?;

            tx.to_active_model()?.update(&db_tx).await?;

            tracing::debug!(
                owner_id,
                transaction_id = %tx.id,
                kind = %tx.kind,
                amount = %tx.amount,
                "transaction updated"
            );

            let mut details = self.load_details(&db_tx, vec![tx]).await?;
            details
                .pop()
                .ok_or_else(|| EngineError::NotFound("transaction".to_string()))
        })
    }

    /// Reverses a transaction's effect and removes the record.
    ///
    /// Unlike edits, deletion is allowed at any age.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<()> {
        let now = self.now();
        with_tx!(self, |db_tx| {
            let model = self
                .find_owned_transaction(&db_tx, transaction_id, owner_id)
                .await?;
            let tx = Transaction::from_model(model, now)?;

            let undo = reversal(tx.kind, tx.amount, tx.account_id, tx.transfer_account_id)?;
            self.apply_effects(&db_tx, &undo).await?;

            let result = transactions::Entity::delete_by_id(tx.id.to_string())
                .exec(&db_tx)
                .await?;
            if result.rows_affected != 1 {
                return Err(EngineError::NotFound("transaction".to_string()));
            }

            tracing::debug!(owner_id, transaction_id = %tx.id, "transaction deleted");
            Ok(())
        })
    }

    /// Resolves the account a new transaction draws on.
    ///
    /// Explicit ids must name an active account of the owner. Without an id,
    /// the most recently created active account is used; if there is none, a
    /// default cash wallet is provisioned inside the caller's unit.
    async fn resolve_source_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        account_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let model = match account_id {
            Some(id) => self
                .find_active_account(db, owner_id, id)
                .await?
                .ok_or_else(|| EngineError::NotFound("account".to_string()))?,
            None => match self.latest_active_account(db, owner_id).await? {
                Some(model) => model,
                None => self.provision_default_account(db, owner_id, now).await?,
            },
        };
        Account::try_from(model)
    }

    async fn provision_default_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<accounts::Model> {
        let account = Account::new(
            owner_id.to_string(),
            DEFAULT_ACCOUNT_NAME.to_string(),
            AccountKind::Cash,
            Money::ZERO,
            DEFAULT_ACCOUNT_COLOR.to_string(),
            Currency::default(),
            now,
        );
        let model = self.insert_account(db, &account).await?;
        tracing::info!(owner_id, account_id = %account.id, "provisioned default account");
        Ok(model)
    }

    /// Validates a transfer destination: present, different from the source,
    /// and an active account of the same owner.
    async fn resolve_destination(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        source_id: Uuid,
        destination_id: Option<Uuid>,
    ) -> ResultEngine<Uuid> {
        let Some(destination_id) = destination_id else {
            return Err(EngineError::InvalidDestination(
                "transfer requires a destination account".to_string(),
            ));
        };
        if destination_id == source_id {
            return Err(EngineError::InvalidDestination(
                "destination must differ from source".to_string(),
            ));
        }
        self.find_active_account(db, owner_id, destination_id)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidDestination("destination account not found".to_string())
            })?;
        Ok(destination_id)
    }
}
