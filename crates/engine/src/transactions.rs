//! Transaction records.
//!
//! A `Transaction` is a single income, expense or transfer against one (or,
//! for transfers, two) of the owner's accounts. Its balance effect is
//! described by [`effects`](crate::effects).

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AccountSnapshot, EngineError, Money, ResultEngine,
    util::{parse_uuid, string_enum},
};

/// How long after creation a transaction may still be edited.
pub const EDIT_WINDOW_HOURS: i64 = 12;

string_enum! {
    pub enum TransactionKind("transaction type") {
        Income => "income",
        Expense => "expense",
        Transfer => "transfer",
    }
}

string_enum! {
    pub enum Category("category") {
        Fuel => "fuel",
        Movie => "movie",
        Food => "food",
        Loan => "loan",
        Medical => "medical",
        Salary => "salary",
        Rent => "rent",
        Shopping => "shopping",
        Transfer => "transfer",
        Other => "other",
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

string_enum! {
    pub enum PaymentMethod("payment method") {
        Cash => "cash",
        Card => "card",
        BankTransfer => "bank_transfer",
        Upi => "upi",
        Wallet => "wallet",
        Other => "other",
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub file_name: String,
}

/// Returns `true` while `now` is less than [`EDIT_WINDOW_HOURS`] after
/// `created_at`.
#[must_use]
pub fn is_editable(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(created_at) < Duration::hours(EDIT_WINDOW_HOURS)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: TransactionKind,
    pub division: String,
    pub category: Category,
    pub amount: Money,
    pub description: String,
    pub date: DateTime<Utc>,
    pub account_id: Uuid,
    /// Present iff `kind` is `Transfer`.
    pub transfer_account_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub recurring: bool,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived on every read from the engine clock, never stored.
    pub editable: bool,
}

impl Transaction {
    /// Recomputes `editable` against `now`.
    pub(crate) fn refresh_editable(&mut self, now: DateTime<Utc>) {
        self.editable = is_editable(self.created_at, now);
    }

    /// Builds the domain value from a stored row, computing `editable` at
    /// `now`.
    pub(crate) fn from_model(model: Model, now: DateTime<Utc>) -> ResultEngine<Self> {
        let attachments: Vec<Attachment> = serde_json::from_str(&model.attachments)
            .map_err(|_| EngineError::InvalidInput("invalid attachments".to_string()))?;
        let mut tx = Self {
            id: parse_uuid(&model.id, "transaction")?,
            owner_id: model.owner_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            division: model.division,
            category: Category::try_from(model.category.as_str())?,
            amount: Money::new(model.amount_minor),
            description: model.description,
            date: model.date,
            account_id: parse_uuid(&model.account_id, "account")?,
            transfer_account_id: model
                .transfer_account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            payment_method: PaymentMethod::try_from(model.payment_method.as_str())?,
            recurring: model.recurring,
            attachments,
            created_at: model.created_at,
            updated_at: model.updated_at,
            editable: false,
        };
        tx.refresh_editable(now);
        Ok(tx)
    }

    pub(crate) fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        let attachments = serde_json::to_string(&self.attachments)
            .map_err(|_| EngineError::InvalidInput("invalid attachments".to_string()))?;
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            owner_id: ActiveValue::Set(self.owner_id.clone()),
            kind: ActiveValue::Set(self.kind.as_str().to_string()),
            division: ActiveValue::Set(self.division.clone()),
            category: ActiveValue::Set(self.category.as_str().to_string()),
            amount_minor: ActiveValue::Set(self.amount.minor()),
            description: ActiveValue::Set(self.description.clone()),
            date: ActiveValue::Set(self.date),
            account_id: ActiveValue::Set(self.account_id.to_string()),
            transfer_account_id: ActiveValue::Set(
                self.transfer_account_id.map(|id| id.to_string()),
            ),
            payment_method: ActiveValue::Set(self.payment_method.as_str().to_string()),
            recurring: ActiveValue::Set(self.recurring),
            attachments: ActiveValue::Set(attachments),
            created_at: ActiveValue::Set(self.created_at),
            updated_at: ActiveValue::Set(self.updated_at),
        })
    }
}

/// A transaction joined with the current state of the accounts it touches.
///
/// Snapshots are `None` only if the referenced row cannot be found; inactive
/// accounts are still returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub account: Option<AccountSnapshot>,
    pub transfer_account: Option<AccountSnapshot>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub kind: String,
    pub division: String,
    pub category: String,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTimeUtc,
    pub account_id: String,
    pub transfer_account_id: Option<String>,
    pub payment_method: String,
    pub recurring: bool,
    pub attachments: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::TransferAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    TransferAccount,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn editable_window_is_half_open() {
        let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(is_editable(created, created));
        assert!(is_editable(
            created,
            created + Duration::hours(12) - Duration::seconds(1)
        ));
        assert!(!is_editable(created, created + Duration::hours(12)));
        assert!(!is_editable(created, created + Duration::days(3)));
    }

    #[test]
    fn enums_reject_unknown_values() {
        assert_eq!(
            TransactionKind::try_from("transfer").unwrap(),
            TransactionKind::Transfer
        );
        assert!(TransactionKind::try_from("refund").is_err());
        assert_eq!(Category::try_from("medical").unwrap(), Category::Medical);
        assert!(Category::try_from("yachts").is_err());
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!(Category::default(), Category::Other);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn stored_row_computes_editable_on_read() {
        let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let model = Model {
            id: Uuid::new_v4().to_string(),
            owner_id: "alice".to_string(),
            kind: "expense".to_string(),
            division: "personal".to_string(),
            category: "food".to_string(),
            amount_minor: 3000,
            description: "lunch".to_string(),
            date: created,
            account_id: Uuid::new_v4().to_string(),
            transfer_account_id: None,
            payment_method: "upi".to_string(),
            recurring: false,
            attachments: r#"[{"url":"https://x/r.png","file_name":"r.png"}]"#.to_string(),
            created_at: created,
            updated_at: created,
        };

        let fresh = Transaction::from_model(model.clone(), created + Duration::hours(1)).unwrap();
        assert!(fresh.editable);
        assert_eq!(fresh.attachments.len(), 1);
        assert_eq!(fresh.payment_method, PaymentMethod::Upi);

        let stale = Transaction::from_model(model, created + Duration::hours(13)).unwrap();
        assert!(!stale.editable);
    }
}
