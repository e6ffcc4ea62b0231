//! Payment-intent records.
//!
//! ```text
//! Unseen --debit--> Active --debit (count == times)--> Exhausted
//!    |                 |
//!    +----cancel-------+-----------cancel------------> Cancelled
//! ```
//!
//! A record is created by the first successful debit or by a cancellation.
//! Exhausted and Cancelled are terminal; both report `is_nullified()`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zkdd_common::{IntentNullifier, PaymentIntentSignals};

use crate::{
    error::{LedgerError, LedgerResult},
    types::Timestamp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    #[default]
    Active,
    /// All `debit_times` debits were taken.
    Exhausted,
    /// Cancelled by the account owner or the payee.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRecord {
    pub status: IntentStatus,
    pub withdrawal_count: u64,
    pub last_debit_timestamp: Timestamp,
}

impl PaymentIntentRecord {
    pub fn is_nullified(&self) -> bool {
        self.status != IntentStatus::Active
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentIntentRegistry {
    records: HashMap<IntentNullifier, PaymentIntentRecord>,
}

impl PaymentIntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, payment_intent: &IntentNullifier) -> Option<&PaymentIntentRecord> {
        self.records.get(payment_intent)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Schedule checks for one more debit at `now`.
    ///
    /// A cancelled intent reports `PaymentIntentNullified`. An exhausted one
    /// reports `PaymentIntentExpired`, the same as any intent whose count has
    /// reached `debit_times`.
    pub fn check_debit(
        &self,
        signals: &PaymentIntentSignals,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let record = self
            .records
            .get(&signals.payment_intent)
            .copied()
            .unwrap_or_default();

        if record.status == IntentStatus::Cancelled {
            return Err(LedgerError::PaymentIntentNullified);
        }
        if record.status == IntentStatus::Exhausted
            || record.withdrawal_count >= signals.debit_times
        {
            return Err(LedgerError::PaymentIntentExpired);
        }
        if record.withdrawal_count > 0 {
            let next_debit_at = record
                .last_debit_timestamp
                .saturating_add(signals.debit_interval);
            if now < next_debit_at {
                return Err(LedgerError::EarlyPaymentNotAllowed { next_debit_at });
            }
        }
        Ok(())
    }

    /// Counts a debit that passed [`check_debit`](Self::check_debit).
    ///
    /// Returns the previous record so a failed settlement can restore it.
    pub fn record_debit(
        &mut self,
        signals: &PaymentIntentSignals,
        now: Timestamp,
    ) -> (Option<PaymentIntentRecord>, PaymentIntentRecord) {
        let previous = self.records.get(&signals.payment_intent).copied();
        let mut record = previous.unwrap_or_default();
        record.withdrawal_count += 1;
        record.last_debit_timestamp = now;
        if record.withdrawal_count >= signals.debit_times {
            record.status = IntentStatus::Exhausted;
        }
        self.records.insert(signals.payment_intent, record);
        (previous, record)
    }

    /// Marks the intent cancelled whatever its state; repeated calls are no-ops.
    pub fn cancel(&mut self, payment_intent: IntentNullifier) -> PaymentIntentRecord {
        let record = self.records.entry(payment_intent).or_default();
        record.status = IntentStatus::Cancelled;
        *record
    }

    pub(crate) fn restore(
        &mut self,
        payment_intent: IntentNullifier,
        previous: Option<PaymentIntentRecord>,
    ) {
        match previous {
            Some(record) => {
                self.records.insert(payment_intent, record);
            }
            None => {
                self.records.remove(&payment_intent);
            }
        }
    }
}
