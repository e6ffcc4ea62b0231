//! Rejections raised by the ledger.
//!
//! Every variant aborts the whole call. Messages start with the protocol tag
//! so clients can match on the text as well as the variant.

use thiserror::Error;

use crate::{bank::BankError, fees::FeeMode, types::Amount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Deposits and top-ups must move a positive amount.
    #[error("ZeroTopup: amount must be greater than zero")]
    ZeroTopup,

    /// Native-currency call value does not cover the declared amount.
    #[error("NotEnoughValue: sent {sent}, required {required}")]
    NotEnoughValue { sent: Amount, required: Amount },

    #[error("AccountAlreadyActive: commitment already backs an active account")]
    AccountAlreadyActive,

    /// The commitment was used before and has been closed for good.
    #[error("AccountAlreadyExists: commitment was used by a closed account")]
    AccountAlreadyExists,

    #[error("InactiveAccount: account is closed or was never opened")]
    InactiveAccount,

    #[error("OnlyAccountOwner: caller is not the account creator")]
    OnlyAccountOwner,

    /// A token operation was sent to a native-currency account.
    #[error("NotTokenAccount: account holds the native currency")]
    NotTokenAccount,

    /// A native-currency operation was sent to a token account.
    #[error("NotEthAccount: account holds a token")]
    NotEthAccount,

    #[error("InvalidProof: verifier rejected the payment intent proof")]
    InvalidProof,

    #[error("PaymentNotAuthorized: debit of {amount} exceeds the authorized {max}")]
    PaymentNotAuthorized { amount: Amount, max: Amount },

    /// The payment intent was cancelled.
    #[error("PaymentIntentNullified: payment intent was cancelled")]
    PaymentIntentNullified,

    /// Every authorized debit of the schedule has been taken.
    #[error("PaymentIntentExpired: payment intent has no debits left")]
    PaymentIntentExpired,

    #[error("NotEnoughAccountBalance: requested {requested}, available {available}")]
    NotEnoughAccountBalance { available: Amount, requested: Amount },

    #[error("EarlyPaymentNotAllowed: next debit allowed at {next_debit_at}")]
    EarlyPaymentNotAllowed { next_debit_at: u64 },

    #[error("OnlyRelatedPartiesCanCancel: caller is neither account owner nor payee")]
    OnlyRelatedPartiesCanCancel,

    /// Administrative call from an address other than the ledger owner.
    #[error("OnlyOwner: caller is not the ledger owner")]
    OnlyOwner,

    #[error("InvalidFeeDivider: divider {divider} is not valid for {mode} fees")]
    InvalidFeeDivider { divider: Amount, mode: FeeMode },

    /// The account strategy does not offer this operation.
    #[error("UnsupportedOperation: {0} is not available for these accounts")]
    UnsupportedOperation(&'static str),

    #[error("RelayerNotSet: no relayer configured")]
    RelayerNotSet,

    #[error("ArithmeticOverflow: balance would overflow")]
    ArithmeticOverflow,

    /// Settlement failed; nothing was applied.
    #[error("transfer failed: {0}")]
    Bank(#[from] BankError),
}

impl LedgerError {
    /// The protocol tag, e.g. `"PaymentIntentExpired"`.
    pub fn tag(&self) -> &'static str {
        match self {
            LedgerError::ZeroTopup => "ZeroTopup",
            LedgerError::NotEnoughValue { .. } => "NotEnoughValue",
            LedgerError::AccountAlreadyActive => "AccountAlreadyActive",
            LedgerError::AccountAlreadyExists => "AccountAlreadyExists",
            LedgerError::InactiveAccount => "InactiveAccount",
            LedgerError::OnlyAccountOwner => "OnlyAccountOwner",
            LedgerError::NotTokenAccount => "NotTokenAccount",
            LedgerError::NotEthAccount => "NotEthAccount",
            LedgerError::InvalidProof => "InvalidProof",
            LedgerError::PaymentNotAuthorized { .. } => "PaymentNotAuthorized",
            LedgerError::PaymentIntentNullified => "PaymentIntentNullified",
            LedgerError::PaymentIntentExpired => "PaymentIntentExpired",
            LedgerError::NotEnoughAccountBalance { .. } => "NotEnoughAccountBalance",
            LedgerError::EarlyPaymentNotAllowed { .. } => "EarlyPaymentNotAllowed",
            LedgerError::OnlyRelatedPartiesCanCancel => "OnlyRelatedPartiesCanCancel",
            LedgerError::OnlyOwner => "OnlyOwner",
            LedgerError::InvalidFeeDivider { .. } => "InvalidFeeDivider",
            LedgerError::UnsupportedOperation(_) => "UnsupportedOperation",
            LedgerError::RelayerNotSet => "RelayerNotSet",
            LedgerError::ArithmeticOverflow => "ArithmeticOverflow",
            LedgerError::Bank(_) => "TransferFailed",
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
