//! Funding for the relayer that submits debits on payees' behalf.

use tracing::info;
use zkdd_common::Address;

use crate::{
    bank::{Asset, AssetBank, Transfer},
    error::{LedgerError, LedgerResult},
    types::{Amount, CallContext},
};

/// Forwards native value to the current relayer so it can pay for submissions.
pub struct RelayerGasTracker<B> {
    owner: Address,
    relayer: Option<Address>,
    bank: B,
}

impl<B: AssetBank> RelayerGasTracker<B> {
    pub fn new(owner: Address, bank: B) -> Self {
        Self {
            owner,
            relayer: None,
            bank,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn relayer(&self) -> Option<Address> {
        self.relayer
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn set_relayer(&mut self, ctx: &CallContext, relayer: Address) -> LedgerResult<()> {
        if ctx.caller != self.owner {
            return Err(LedgerError::OnlyOwner);
        }
        self.relayer = Some(relayer);
        info!(%relayer, "relayer updated");
        Ok(())
    }

    /// Sends the whole call value to the relayer.
    pub fn top_up_relayer(&mut self, ctx: &CallContext) -> LedgerResult<Amount> {
        let relayer = self.relayer.ok_or(LedgerError::RelayerNotSet)?;
        if ctx.value == 0 {
            return Err(LedgerError::ZeroTopup);
        }
        self.bank.execute(&[Transfer::direct(
            Asset::Native,
            ctx.caller,
            relayer,
            ctx.value,
        )])?;
        info!(%relayer, from = %ctx.caller, amount = ctx.value, "relayer topped up");
        Ok(ctx.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::InMemoryBank;

    #[test]
    fn top_up_requires_relayer() {
        let owner = Address::from_label("owner");
        let mut tracker = RelayerGasTracker::new(owner, InMemoryBank::new());
        let ctx = CallContext::new(owner, 0).with_value(1);
        assert_eq!(
            tracker.top_up_relayer(&ctx),
            Err(LedgerError::RelayerNotSet)
        );
    }
}
