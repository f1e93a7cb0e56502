//! The module contains `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money,
    util::{model_currency, parse_uuid, string_enum},
};

string_enum! {
    /// What kind of place the money is kept in.
    pub enum AccountKind("account kind") {
        Cash => "cash",
        Bank => "bank",
        CreditCard => "credit_card",
        DigitalWallet => "digital_wallet",
        Investment => "investment",
        Savings => "savings",
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        Self::Bank
    }
}

/// An account.
///
/// An account is a representation of a real wallet, a bank account, a card or
/// anything else where money is kept. Its balance is denormalized from the
/// transaction history and is only ever changed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
    pub color: String,
    pub currency: Currency,
    /// Soft-delete flag. Inactive accounts stay referenced by their history.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub(crate) fn new(
        owner_id: String,
        name: String,
        kind: AccountKind,
        balance: Money,
        color: String,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            kind,
            balance,
            color,
            currency,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The account fields a transaction read is joined with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: Uuid,
    pub name: String,
    pub balance: Money,
    pub currency: Currency,
    pub active: bool,
}

impl From<&Account> for AccountSnapshot {
    fn from(value: &Account) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            balance: value.balance,
            currency: value.currency.clone(),
            active: value.active,
        }
    }
}

/// Sum of the balances of all active accounts of an owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetWorth {
    pub total: Money,
    pub account_count: u64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub kind: String,
    pub balance_minor: i64,
    pub color: String,
    pub currency: String,
    pub active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            balance_minor: ActiveValue::Set(value.balance.minor()),
            color: ActiveValue::Set(value.color.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            active: ActiveValue::Set(value.active),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            owner_id: model.owner_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            balance: Money::new(model.balance_minor),
            color: model.color,
            currency: model_currency(&model.currency)?,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn account() -> Account {
        Account::new(
            "alice".to_string(),
            "Cash".to_string(),
            AccountKind::Cash,
            Money::new(10_000),
            "#fff".to_string(),
            Currency::default(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
    }

    #[test]
    fn model_round_trip_keeps_fields() {
        let account = account();
        let active: ActiveModel = (&account).into();
        let model = Model {
            id: active.id.unwrap(),
            owner_id: active.owner_id.unwrap(),
            name: active.name.unwrap(),
            kind: active.kind.unwrap(),
            balance_minor: active.balance_minor.unwrap(),
            color: active.color.unwrap(),
            currency: active.currency.unwrap(),
            active: active.active.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };
        assert_eq!(model.kind, "cash");
        assert_eq!(Account::try_from(model).unwrap(), account);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            AccountKind::try_from("mattress"),
            Err(EngineError::InvalidInput(_))
        ));
        assert_eq!(
            AccountKind::try_from("digital_wallet").unwrap(),
            AccountKind::DigitalWallet
        );
        assert_eq!(AccountKind::default(), AccountKind::Bank);
    }
}
