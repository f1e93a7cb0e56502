//! Balance effects.
//!
//! An [`Effect`] is a single signed balance change applied to one account as
//! part of a [`Transaction`](crate::Transaction):
//!
//! - income: `+amount` on the source account
//! - expense: `-amount` on the source account
//! - transfer: `-amount` on the source, `+amount` on the destination
//!
//! Undoing a transaction applies the same effects with the delta negated.
//! In the engine, *every* change to balances happens via effects.

use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, TransactionKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Effect {
    pub account_id: Uuid,
    pub delta: Money,
}

impl Effect {
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            account_id: self.account_id,
            delta: -self.delta,
        }
    }
}

/// Computes the effects of a transaction on its accounts.
///
/// Transfers require a destination; other kinds ignore it.
pub fn effects(
    kind: TransactionKind,
    amount: Money,
    account_id: Uuid,
    transfer_account_id: Option<Uuid>,
) -> ResultEngine<Vec<Effect>> {
    let amount = amount.positive()?;
    let out = match kind {
        TransactionKind::Income => vec![Effect {
            account_id,
            delta: amount,
        }],
        TransactionKind::Expense => vec![Effect {
            account_id,
            delta: -amount,
        }],
        TransactionKind::Transfer => {
            let destination = transfer_account_id.ok_or_else(|| {
                EngineError::InvalidDestination("transfer requires a destination".to_string())
            })?;
            vec![
                Effect {
                    account_id,
                    delta: -amount,
                },
                Effect {
                    account_id: destination,
                    delta: amount,
                },
            ]
        }
    };
    Ok(out)
}

/// The effects that undo `effects(kind, amount, ..)`.
pub fn reversal(
    kind: TransactionKind,
    amount: Money,
    account_id: Uuid,
    transfer_account_id: Option<Uuid>,
) -> ResultEngine<Vec<Effect>> {
    Ok(effects(kind, amount, account_id, transfer_account_id)?
        .into_iter()
        .map(Effect::reversed)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn apply(balances: &mut HashMap<Uuid, Money>, effects: &[Effect]) {
        for effect in effects {
            *balances.entry(effect.account_id).or_default() += effect.delta;
        }
    }

    #[test]
    fn expense_debits_source() {
        let a = Uuid::new_v4();
        let out = effects(TransactionKind::Expense, Money::new(3000), a, None).unwrap();
        assert_eq!(
            out,
            vec![Effect {
                account_id: a,
                delta: Money::new(-3000)
            }]
        );
    }

    #[test]
    fn transfer_conserves_total() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut balances = HashMap::from([(a, Money::new(10_000)), (b, Money::ZERO)]);
        let before: Money = balances.values().copied().sum();

        let out = effects(TransactionKind::Transfer, Money::new(2000), a, Some(b)).unwrap();
        apply(&mut balances, &out);

        assert_eq!(balances[&a], Money::new(8000));
        assert_eq!(balances[&b], Money::new(2000));
        assert_eq!(balances.values().copied().sum::<Money>(), before);
    }

    #[test]
    fn reversal_restores_every_kind() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for kind in TransactionKind::ALL.iter().copied() {
            let mut balances = HashMap::from([(a, Money::new(5000)), (b, Money::new(-700))]);
            let snapshot = balances.clone();
            let amount = Money::new(1234);

            apply(&mut balances, &effects(kind, amount, a, Some(b)).unwrap());
            assert_ne!(balances, snapshot, "{kind} must change a balance");
            apply(&mut balances, &reversal(kind, amount, a, Some(b)).unwrap());
            assert_eq!(balances, snapshot, "{kind} reversal must be exact");
        }
    }

    #[test]
    fn transfer_without_destination_fails() {
        let err = effects(TransactionKind::Transfer, Money::new(1), Uuid::new_v4(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDestination(_)));
    }

    #[test]
    fn non_positive_amount_fails() {
        let err = effects(TransactionKind::Income, Money::ZERO, Uuid::new_v4(), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
