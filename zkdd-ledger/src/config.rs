//! Ledger configuration and administrative access.
//!
//! Mutable settings (fee divider, fee recipient, relayer allow-list) live in
//! [`LedgerConfig`]. Changing them requires an [`AdminCapability`], which only
//! [`LedgerConfig::authorize`] hands out and only to the owner.

use std::{collections::BTreeSet, env, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zkdd_common::Address;

use crate::{
    error::{LedgerError, LedgerResult},
    fees::{FeeMode, FeePolicy},
    types::Amount,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    owner: Address,
    fee_recipient: Address,
    fee_policy: FeePolicy,
    relayers: BTreeSet<Address>,
}

/// Proof that the holder passed the owner check of one particular config.
#[derive(Debug)]
pub struct AdminCapability {
    owner: Address,
}

impl LedgerConfig {
    pub fn new(owner: Address, fee_policy: FeePolicy) -> Self {
        Self {
            owner,
            fee_recipient: owner,
            fee_policy,
            relayers: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    pub fn fee_policy(&self) -> FeePolicy {
        self.fee_policy
    }

    pub fn is_relayer(&self, address: &Address) -> bool {
        self.relayers.contains(address)
    }

    pub fn relayers(&self) -> impl Iterator<Item = &Address> {
        self.relayers.iter()
    }

    pub fn authorize(&self, caller: Address) -> LedgerResult<AdminCapability> {
        if caller != self.owner {
            warn!(%caller, "rejected administrative call");
            return Err(LedgerError::OnlyOwner);
        }
        Ok(AdminCapability { owner: caller })
    }

    fn check(&self, capability: &AdminCapability) -> LedgerResult<()> {
        if capability.owner != self.owner {
            return Err(LedgerError::OnlyOwner);
        }
        Ok(())
    }

    pub fn update_fee_divider(
        &mut self,
        capability: &AdminCapability,
        divider: Amount,
    ) -> LedgerResult<()> {
        self.check(capability)?;
        self.fee_policy = self.fee_policy.with_divider(divider)?;
        info!(divider, mode = %self.fee_policy.mode(), "fee divider updated");
        Ok(())
    }

    pub fn set_fee_recipient(
        &mut self,
        capability: &AdminCapability,
        recipient: Address,
    ) -> LedgerResult<()> {
        self.check(capability)?;
        self.fee_recipient = recipient;
        Ok(())
    }

    /// Returns `false` if the relayer was already allowed.
    pub fn add_relayer(
        &mut self,
        capability: &AdminCapability,
        relayer: Address,
    ) -> LedgerResult<bool> {
        self.check(capability)?;
        Ok(self.relayers.insert(relayer))
    }

    pub fn remove_relayer(
        &mut self,
        capability: &AdminCapability,
        relayer: &Address,
    ) -> LedgerResult<bool> {
        self.check(capability)?;
        Ok(self.relayers.remove(relayer))
    }
}

/// Deployment settings, from the environment or a JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSettings {
    pub owner: Address,
    #[serde(default = "default_ledger_address")]
    pub ledger_address: Address,
    #[serde(default)]
    pub fee_mode: FeeMode,
    /// Falls back to the mode's default divider.
    #[serde(default)]
    pub fee_divider: Option<Amount>,
    #[serde(default)]
    pub fee_recipient: Option<Address>,
    #[serde(default)]
    pub relayers: Vec<Address>,
}

fn default_ledger_address() -> Address {
    Address::from_label("zkdd-ledger")
}

impl LedgerSettings {
    /// Load settings from `ZKDD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let owner: Address = lookup("ZKDD_OWNER")
            .context("ZKDD_OWNER must be set")?
            .parse()
            .context("ZKDD_OWNER is not an address")?;

        let ledger_address: Address = match lookup("ZKDD_LEDGER_ADDRESS") {
            Some(raw) => raw.parse().context("ZKDD_LEDGER_ADDRESS is not an address")?,
            None => default_ledger_address(),
        };

        let fee_mode = match lookup("ZKDD_FEE_MODE") {
            Some(raw) => {
                FeeMode::from_str(&raw).ok_or_else(|| anyhow!("unknown ZKDD_FEE_MODE {raw}"))?
            }
            None => FeeMode::default(),
        };

        let fee_divider = lookup("ZKDD_FEE_DIVIDER")
            .map(|raw| raw.trim().parse::<Amount>())
            .transpose()
            .context("ZKDD_FEE_DIVIDER is not an integer")?;

        let fee_recipient = lookup("ZKDD_FEE_RECIPIENT")
            .map(|raw| raw.parse::<Address>())
            .transpose()
            .context("ZKDD_FEE_RECIPIENT is not an address")?;

        let relayers = lookup("ZKDD_RELAYERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Address>().with_context(|| format!("bad relayer {s}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            owner,
            ledger_address,
            fee_mode,
            fee_divider,
            fee_recipient,
            relayers,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse settings at {}", path.display()))
    }

    pub fn fee_policy(&self) -> LedgerResult<FeePolicy> {
        FeePolicy::new(
            self.fee_mode,
            self.fee_divider
                .unwrap_or_else(|| self.fee_mode.default_divider()),
        )
    }

    pub fn into_config(self) -> LedgerResult<LedgerConfig> {
        let mut config = LedgerConfig::new(self.owner, self.fee_policy()?);
        if let Some(recipient) = self.fee_recipient {
            config.fee_recipient = recipient;
        }
        config.relayers.extend(self.relayers);
        Ok(config)
    }
}
