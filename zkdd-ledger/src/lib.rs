//! Private direct debits on a shared ledger.
//!
//! A payer opens an account keyed only by a Poseidon commitment. Payees pull
//! bounded, scheduled payments from it by presenting a payment-intent proof;
//! the ledger never learns which secret backs the account.
//!
//! - [`accounts`]: custodial and allowance-backed account strategies
//! - [`intents`]: per-intent debit counters and cancellation
//! - [`fees`]: protocol and relayer fee splits
//! - [`engine`]: the [`DirectDebitLedger`] that ties them together

pub mod accounts;
pub mod bank;
pub mod config;
pub mod engine;
pub mod error;
pub mod fees;
pub mod gas_tracker;
pub mod intents;
pub mod types;

pub use accounts::{AccountStore, AccountStrategy, ConnectedAccounts, CustodialAccounts};
pub use bank::{Asset, AssetBank, BankError, InMemoryBank, Transfer};
pub use config::{AdminCapability, LedgerConfig, LedgerSettings};
pub use engine::{ConnectedWallets, DebitReceipt, DirectDebitLedger, VirtualAccounts};
pub use error::{LedgerError, LedgerResult};
pub use fees::{calculate_dual_fee, calculate_fee, FeeMode, FeePolicy, FeeSplit};
pub use gas_tracker::RelayerGasTracker;
pub use intents::{IntentStatus, PaymentIntentRecord, PaymentIntentRegistry};
pub use types::{Account, AccountView, Amount, CallContext, DebitRequest, EncryptedNote, Timestamp};
