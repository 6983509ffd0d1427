//! Wallet and its append-only transaction ledger.
//!
//! The cached balance is always derivable by replaying the transactions,
//! which gives an audit trail independent of the balance field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LudusError;

/// Direction of a wallet mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

/// Single immutable ledger row. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub learner_id: String,
    pub direction: Direction,
    pub amount: u64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// One wallet per learner, created lazily at zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Wallet {
    pub learner_id: String,
    pub balance: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Wallet {
    pub fn new(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            ..Default::default()
        }
    }

    pub fn credit(&mut self, amount: u64, reason: impl Into<String>, now: DateTime<Utc>) {
        self.balance += amount;
        self.append(Direction::Credit, amount, reason.into(), now);
    }

    pub fn debit(
        &mut self,
        amount: u64,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LudusError> {
        if amount > self.balance {
            return Err(LudusError::InsufficientBalance {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.append(Direction::Debit, amount, reason.into(), now);
        Ok(())
    }

    fn append(&mut self, direction: Direction, amount: u64, reason: String, now: DateTime<Utc>) {
        self.transactions.push(Transaction {
            id: Uuid::new_v4(),
            learner_id: self.learner_id.clone(),
            direction,
            amount,
            reason,
            timestamp: now,
        });
    }

    /// Replay the ledger and check it against the cached balance.
    pub fn audit(&self) -> bool {
        let mut sum: i128 = 0;
        for tx in &self.transactions {
            match tx.direction {
                Direction::Credit => sum += tx.amount as i128,
                Direction::Debit => sum -= tx.amount as i128,
            }
        }
        sum >= 0 && sum == self.balance as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit_append_one_row_each() {
        let now = Utc::now();
        let mut w = Wallet::new("l1");
        w.credit(10, "Completed counting-kids-1", now);
        w.debit(4, "Replay unlock: counting-kids-1", now).unwrap();
        assert_eq!(w.balance, 6);
        assert_eq!(w.transactions.len(), 2);
        assert!(w.audit());
    }

    #[test]
    fn test_debit_over_balance_fails_without_mutation() {
        let now = Utc::now();
        let mut w = Wallet::new("l1");
        w.credit(3, "seed", now);
        let err = w.debit(5, "too much", now).unwrap_err();
        match err {
            LudusError::InsufficientBalance {
                required,
                available,
            } => {
                assert_eq!(required, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(w.balance, 3);
        assert_eq!(w.transactions.len(), 1);
        assert!(w.audit());
    }

    #[test]
    fn test_audit_detects_tampered_balance() {
        let now = Utc::now();
        let mut w = Wallet::new("l1");
        w.credit(10, "seed", now);
        w.balance = 42;
        assert!(!w.audit());
    }
}
