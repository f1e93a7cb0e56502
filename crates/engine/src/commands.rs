//! Command structs for engine operations.
//!
//! These types group parameters for write operations (account creation and
//! edits, transaction creation and patches), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, Attachment, Category, Currency, Money, PaymentMethod, TransactionKind};

/// Create an account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub owner_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Money,
    pub color: Option<String>,
    pub currency: Currency,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            kind: AccountKind::default(),
            initial_balance: Money::ZERO,
            color: None,
            currency: Currency::default(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, balance: Money) -> Self {
        self.initial_balance = balance;
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }
}

/// Partial account update. `None` leaves the field unchanged.
///
/// The balance and the active flag are deliberately not patchable.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub color: Option<String>,
    pub currency: Option<Currency>,
}

impl AccountPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.color.is_none() && self.currency.is_none()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// Create a transaction.
///
/// `account_id` is optional: when absent the engine uses the owner's most
/// recently created active account, provisioning a default wallet if the
/// owner has none. `date` defaults to the creation time.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub owner_id: String,
    pub kind: TransactionKind,
    pub division: String,
    pub category: Category,
    pub amount: Money,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
    pub transfer_account_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub recurring: bool,
    pub attachments: Vec<Attachment>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        kind: TransactionKind,
        division: impl Into<String>,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind,
            division: division.into(),
            category: Category::default(),
            amount,
            description: description.into(),
            date: None,
            account_id: None,
            transfer_account_id: None,
            payment_method: PaymentMethod::default(),
            recurring: false,
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn transfer_account_id(mut self, account_id: Uuid) -> Self {
        self.transfer_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    #[must_use]
    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    #[must_use]
    pub fn attachment(mut self, url: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.attachments.push(Attachment {
            url: url.into(),
            file_name: file_name.into(),
        });
        self
    }
}

/// Patch for an editable transaction. `None` leaves the field unchanged.
///
/// Only these fields can be edited; the recurring flag and attachments are
/// fixed at creation.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub category: Option<Category>,
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
    pub transfer_account_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub division: Option<String>,
}

impl TransactionPatch {
    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn transfer_account_id(mut self, account_id: Uuid) -> Self {
        self.transfer_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    #[must_use]
    pub fn division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }
}
