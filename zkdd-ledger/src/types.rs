//! Records owned by the ledger.

use serde::{Deserialize, Serialize};
use zkdd_common::{Address, Commitment, PackedProof, PaymentIntentSignals};

use crate::bank::Asset;

/// Smallest currency unit.
pub type Amount = u128;
/// Ledger-observed seconds.
pub type Timestamp = u64;

/// Who is calling, with how much native value, and when the ledger saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        Self {
            caller,
            value: 0,
            timestamp,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub creator: Address,
    /// `None` for the native currency.
    pub token: Option<Address>,
    #[serde(with = "zkdd_common::serde_decimal")]
    pub balance: Amount,
    pub active: bool,
}

impl Account {
    pub fn asset(&self) -> Asset {
        Asset::from_token(self.token)
    }

    pub fn is_native(&self) -> bool {
        self.token.is_none()
    }
}

/// Encrypted note bytes; opaque to the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedNote(pub Vec<u8>);

impl EncryptedNote {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EncryptedNote {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// What `get_account` reports.
///
/// `balance` is the ledger's own figure (or, for connected wallets, what the
/// allowance lets the ledger pull). `observed_balance` is only set for native
/// custody, where value can reach the ledger without passing through a top-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub commitment: Commitment,
    pub creator: Address,
    pub token: Option<Address>,
    #[serde(with = "zkdd_common::serde_decimal")]
    pub balance: Amount,
    pub active: bool,
    pub observed_balance: Option<Amount>,
}

impl AccountView {
    pub fn diverges(&self) -> bool {
        self.observed_balance
            .map_or(false, |observed| observed != self.balance)
    }
}

/// A debit submitted by the payee or a relayer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebitRequest {
    pub proof: PackedProof,
    pub signals: PaymentIntentSignals,
    /// Amount pulled this time, at most `signals.max_debit_amount`.
    pub amount: Amount,
}
