use tracing::{debug, warn};
use zkdd_common::Commitment;

use super::{AccountStore, AccountStrategy, DebitSource, Funding, LedgerEnv, OpenRequest};
use crate::{
    bank::{Asset, Transfer},
    error::{LedgerError, LedgerResult},
    types::{Account, AccountView, Amount, CallContext},
};

/// Accounts whose funds the ledger holds itself.
#[derive(Clone, Debug, Default)]
pub struct CustodialAccounts {
    store: AccountStore,
}

impl CustodialAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Inbound funding: the whole native call value, or a token pull of `amount`.
fn funding_transfer(
    env: &LedgerEnv<'_>,
    ctx: &CallContext,
    asset: Asset,
    amount: Amount,
) -> Transfer {
    match asset {
        Asset::Native => Transfer::direct(Asset::Native, ctx.caller, env.ledger, ctx.value),
        Asset::Token(token) => Transfer::pull(token, ctx.caller, env.ledger, env.ledger, amount),
    }
}

fn ensure_value(ctx: &CallContext, asset: Asset, amount: Amount) -> LedgerResult<()> {
    if asset == Asset::Native && ctx.value < amount {
        return Err(LedgerError::NotEnoughValue {
            sent: ctx.value,
            required: amount,
        });
    }
    Ok(())
}

impl AccountStrategy for CustodialAccounts {
    fn store(&self) -> &AccountStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AccountStore {
        &mut self.store
    }

    fn open(
        &mut self,
        env: &LedgerEnv<'_>,
        ctx: &CallContext,
        request: OpenRequest,
    ) -> LedgerResult<Vec<Transfer>> {
        let asset = Asset::from_token(request.token);
        if request.amount == 0 {
            return Err(LedgerError::ZeroTopup);
        }
        ensure_value(ctx, asset, request.amount)?;
        self.store.ensure_fresh(&request.commitment)?;

        self.store.insert(
            request.commitment,
            Account {
                creator: ctx.caller,
                token: request.token,
                balance: request.amount,
                active: true,
            },
            request.encrypted_note,
        )?;
        debug!(
            commitment = %request.commitment,
            %asset,
            amount = request.amount,
            "custodial account opened"
        );
        Ok(vec![funding_transfer(env, ctx, asset, request.amount)])
    }

    fn top_up(
        &mut self,
        env: &LedgerEnv<'_>,
        ctx: &CallContext,
        commitment: &Commitment,
        funding: Funding,
        amount: Amount,
    ) -> LedgerResult<Vec<Transfer>> {
        let account = *self.store.active(commitment)?;
        match (funding, account.is_native()) {
            (Funding::Token, true) => return Err(LedgerError::NotTokenAccount),
            (Funding::Native, false) => return Err(LedgerError::NotEthAccount),
            _ => {}
        }
        if amount == 0 {
            return Err(LedgerError::ZeroTopup);
        }
        let asset = account.asset();
        ensure_value(ctx, asset, amount)?;

        self.store.credit(commitment, amount)?;
        Ok(vec![funding_transfer(env, ctx, asset, amount)])
    }

    fn debit(
        &mut self,
        _env: &LedgerEnv<'_>,
        commitment: &Commitment,
        amount: Amount,
    ) -> LedgerResult<DebitSource> {
        let asset = self.store.active(commitment)?.asset();
        self.store.take(commitment, amount)?;
        Ok(DebitSource::Custody { asset })
    }

    fn withdraw(
        &mut self,
        env: &LedgerEnv<'_>,
        ctx: &CallContext,
        commitment: &Commitment,
    ) -> LedgerResult<Vec<Transfer>> {
        match self.store.get(commitment) {
            Some(account) if account.creator != ctx.caller => {
                return Err(LedgerError::OnlyAccountOwner)
            }
            Some(_) => {}
            None => return Err(LedgerError::InactiveAccount),
        }
        let closed = self.store.close(commitment)?;
        let mut transfers = Vec::new();
        if closed.balance > 0 {
            transfers.push(Transfer::direct(
                closed.asset(),
                env.ledger,
                closed.creator,
                closed.balance,
            ));
        }
        Ok(transfers)
    }

    fn get_account(&self, env: &LedgerEnv<'_>, commitment: &Commitment) -> Option<AccountView> {
        let mut view = self.store.view(commitment)?;
        if view.token.is_none() && view.active {
            let surplus = self.store.native_surplus(env);
            view.observed_balance = Some(view.balance.saturating_add(surplus));
            if surplus > 0 {
                warn!(
                    %commitment,
                    tracked = view.balance,
                    surplus,
                    "ledger holds native value not tracked by any account"
                );
            }
        }
        Some(view)
    }
}
