//! Fee arithmetic.
//!
//! ```text
//! single: fee = amount / divider                      net = amount - fee
//! dual:   protocol = relayer = amount / divider       net = amount - protocol - relayer
//! ```
//!
//! Division truncates, so the parts always sum back to `amount`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{LedgerError, LedgerResult},
    types::Amount,
};

/// 1% to a single recipient.
pub const DEFAULT_SINGLE_DIVIDER: Amount = 100;
/// 0.5% to the protocol plus 0.5% to the relayer.
pub const DEFAULT_DUAL_DIVIDER: Amount = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeeMode {
    Single,
    #[default]
    Dual,
}

impl FeeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeMode::Single => "single",
            FeeMode::Dual => "dual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Some(FeeMode::Single),
            "dual" => Some(FeeMode::Dual),
            _ => None,
        }
    }

    pub fn default_divider(&self) -> Amount {
        match self {
            FeeMode::Single => DEFAULT_SINGLE_DIVIDER,
            FeeMode::Dual => DEFAULT_DUAL_DIVIDER,
        }
    }

    fn min_divider(&self) -> Amount {
        match self {
            FeeMode::Single => 1,
            FeeMode::Dual => 2,
        }
    }
}

impl fmt::Display for FeeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gross debit split into its recipients' shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    #[serde(with = "zkdd_common::serde_decimal")]
    pub protocol_fee: Amount,
    /// Always zero in single mode.
    #[serde(with = "zkdd_common::serde_decimal")]
    pub relayer_fee: Amount,
    #[serde(with = "zkdd_common::serde_decimal")]
    pub net: Amount,
}

impl FeeSplit {
    pub fn total_fee(&self) -> Amount {
        self.protocol_fee + self.relayer_fee
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    mode: FeeMode,
    divider: Amount,
}

impl FeePolicy {
    pub fn new(mode: FeeMode, divider: Amount) -> LedgerResult<Self> {
        if divider < mode.min_divider() {
            return Err(LedgerError::InvalidFeeDivider { divider, mode });
        }
        Ok(Self { mode, divider })
    }

    pub fn single() -> Self {
        Self {
            mode: FeeMode::Single,
            divider: DEFAULT_SINGLE_DIVIDER,
        }
    }

    pub fn dual() -> Self {
        Self {
            mode: FeeMode::Dual,
            divider: DEFAULT_DUAL_DIVIDER,
        }
    }

    pub fn mode(&self) -> FeeMode {
        self.mode
    }

    pub fn divider(&self) -> Amount {
        self.divider
    }

    pub fn with_divider(&self, divider: Amount) -> LedgerResult<Self> {
        Self::new(self.mode, divider)
    }

    pub fn split(&self, amount: Amount) -> FeeSplit {
        match self.mode {
            FeeMode::Single => {
                let (fee, net) = calculate_fee(amount, self.divider);
                FeeSplit {
                    protocol_fee: fee,
                    relayer_fee: 0,
                    net,
                }
            }
            FeeMode::Dual => calculate_dual_fee(amount, self.divider),
        }
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::dual()
    }
}

/// `(fee, net)`; a zero divider charges nothing.
pub fn calculate_fee(amount: Amount, divider: Amount) -> (Amount, Amount) {
    let fee = amount.checked_div(divider).unwrap_or(0);
    (fee, amount - fee)
}

/// Protocol and relayer fees computed independently from the same divider.
pub fn calculate_dual_fee(amount: Amount, divider: Amount) -> FeeSplit {
    let fee = amount.checked_div(divider).unwrap_or(0);
    let protocol_fee = fee;
    let relayer_fee = fee.min(amount - protocol_fee);
    FeeSplit {
        protocol_fee,
        relayer_fee,
        net: amount - protocol_fee - relayer_fee,
    }
}
