use zkdd_common::Commitment;

use super::{AccountStore, AccountStrategy, DebitSource, Funding, LedgerEnv, OpenRequest};
use crate::{
    bank::{Asset, Transfer},
    error::{LedgerError, LedgerResult},
    types::{Account, AccountView, Amount, CallContext},
};

/// Accounts backed by a token allowance on the payer's own wallet.
///
/// The stored balance stays zero; what the ledger can pull is
/// `min(wallet balance, allowance)` at the time of the call.
#[derive(Clone, Debug, Default)]
pub struct ConnectedAccounts {
    store: AccountStore,
}

impl ConnectedAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    fn spendable(env: &LedgerEnv<'_>, account: &Account) -> Amount {
        match account.token {
            Some(token) => {
                let balance = env.bank.balance_of(Asset::Token(token), account.creator);
                let allowance = env.bank.allowance(token, account.creator, env.ledger);
                balance.min(allowance)
            }
            None => 0,
        }
    }
}

impl AccountStrategy for ConnectedAccounts {
    fn store(&self) -> &AccountStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AccountStore {
        &mut self.store
    }

    fn open(
        &mut self,
        _env: &LedgerEnv<'_>,
        ctx: &CallContext,
        request: OpenRequest,
    ) -> LedgerResult<Vec<Transfer>> {
        if request.token.is_none() {
            return Err(LedgerError::NotTokenAccount);
        }
        if request.amount > 0 {
            return Err(LedgerError::UnsupportedOperation("deposit"));
        }
        self.store.ensure_fresh(&request.commitment)?;
        self.store.insert(
            request.commitment,
            Account {
                creator: ctx.caller,
                token: request.token,
                balance: 0,
                active: true,
            },
            request.encrypted_note,
        )?;
        Ok(Vec::new())
    }

    fn top_up(
        &mut self,
        _env: &LedgerEnv<'_>,
        _ctx: &CallContext,
        _commitment: &Commitment,
        _funding: Funding,
        _amount: Amount,
    ) -> LedgerResult<Vec<Transfer>> {
        Err(LedgerError::UnsupportedOperation("top up"))
    }

    fn debit(
        &mut self,
        env: &LedgerEnv<'_>,
        commitment: &Commitment,
        amount: Amount,
    ) -> LedgerResult<DebitSource> {
        let account = *self.store.active(commitment)?;
        let available = Self::spendable(env, &account);
        if available < amount {
            return Err(LedgerError::NotEnoughAccountBalance {
                available,
                requested: amount,
            });
        }
        let token = account.token.ok_or(LedgerError::NotTokenAccount)?;
        Ok(DebitSource::Allowance {
            owner: account.creator,
            token,
        })
    }

    /// Disconnects the wallet; no funds move.
    fn withdraw(
        &mut self,
        _env: &LedgerEnv<'_>,
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
        self.store.close(commitment)?;
        Ok(Vec::new())
    }

    fn get_account(&self, env: &LedgerEnv<'_>, commitment: &Commitment) -> Option<AccountView> {
        let account = self.store.get(commitment)?;
        let mut view = self.store.view(commitment)?;
        if account.active {
            view.balance = Self::spendable(env, account);
        }
        Some(view)
    }
}
