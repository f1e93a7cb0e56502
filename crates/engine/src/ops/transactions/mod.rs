use std::collections::HashMap;

use uuid::Uuid;

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{
    Account, AccountSnapshot, EngineError, ResultEngine, Transaction, TransactionDetail, accounts,
    transactions,
};

use super::Engine;

mod list;
mod write;

pub use list::{
    ListQuery, MAX_PAGE_LIMIT, SortField, SortOrder, TransactionFilter, TransactionPage,
};

impl Engine {
    /// Returns a transaction owned by `owner_id`, joined with its accounts.
    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<TransactionDetail> {
        let model = self
            .find_owned_transaction(&self.database, transaction_id, owner_id)
            .await?;
        let tx = Transaction::from_model(model, self.now())?;
        let mut details = self.load_details(&self.database, vec![tx]).await?;
        details
            .pop()
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))
    }

    pub(super) async fn find_owned_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))
    }

    /// Joins transactions with snapshots of the accounts they reference.
    ///
    /// Inactive accounts are included: history keeps pointing at them.
    pub(super) async fn load_details<C: ConnectionTrait>(
        &self,
        db: &C,
        txs: Vec<Transaction>,
    ) -> ResultEngine<Vec<TransactionDetail>> {
        let mut ids: Vec<String> = txs
            .iter()
            .flat_map(|tx| std::iter::once(tx.account_id).chain(tx.transfer_account_id))
            .map(|id| id.to_string())
            .collect();
        ids.sort();
        ids.dedup();

        let mut snapshots: HashMap<Uuid, AccountSnapshot> = HashMap::with_capacity(ids.len());
        if !ids.is_empty() {
            let models = accounts::Entity::find()
                .filter(accounts::Column::Id.is_in(ids))
                .all(db)
                .await?;
            for model in models {
                let account = Account::try_from(model)?;
                snapshots.insert(account.id, AccountSnapshot::from(&account));
            }
        }

        Ok(txs
            .into_iter()
            .map(|tx| TransactionDetail {
                account: snapshots.get(&tx.account_id).cloned(),
                transfer_account: tx
                    .transfer_account_id
                    .and_then(|id| snapshots.get(&id).cloned()),
                transaction: tx,
            })
            .collect())
    }
}
