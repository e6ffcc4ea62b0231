//! Commitment-keyed accounts.
//!
//! Both account flavours share an [`AccountStore`] and differ only in where
//! the money sits:
//!
//! - [`CustodialAccounts`]: the ledger holds the funds and tracks a balance.
//! - [`ConnectedAccounts`]: the payer keeps the funds and grants the ledger a
//!   token allowance; the balance is synthesized from the wallet.
//!
//! Strategies mutate ledger state and return the transfers that settle the
//! change. Executing those transfers is left to the engine.

use std::collections::HashMap;

use zkdd_common::{Address, Commitment};

use crate::{
    bank::{Asset, AssetBank, Transfer},
    error::{LedgerError, LedgerResult},
    types::{Account, AccountView, Amount, CallContext, EncryptedNote},
};

mod connected;
mod custodial;

pub use connected::ConnectedAccounts;
pub use custodial::CustodialAccounts;

/// Read access to the world outside the ledger's books.
pub struct LedgerEnv<'a> {
    /// Address holding custodied funds and spending allowances.
    pub ledger: Address,
    pub bank: &'a dyn AssetBank,
}

#[derive(Clone, Debug)]
pub struct OpenRequest {
    pub commitment: Commitment,
    pub token: Option<Address>,
    pub amount: Amount,
    pub encrypted_note: EncryptedNote,
}

/// Currency kind a top-up call claims to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Funding {
    Native,
    Token,
}

/// Where the funds of an approved debit come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebitSource {
    /// Paid out of the ledger's own holdings.
    Custody { asset: Asset },
    /// Pulled from the payer's wallet through the ledger's allowance.
    Allowance { owner: Address, token: Address },
}

impl DebitSource {
    pub fn payout(&self, ledger: Address, to: Address, amount: Amount) -> Transfer {
        match *self {
            DebitSource::Custody { asset } => Transfer::direct(asset, ledger, to, amount),
            DebitSource::Allowance { owner, token } => {
                Transfer::pull(token, owner, ledger, to, amount)
            }
        }
    }
}

/// The operations every account flavour offers.
pub trait AccountStrategy {
    fn store(&self) -> &AccountStore;

    fn store_mut(&mut self) -> &mut AccountStore;

    fn open(
        &mut self,
        env: &LedgerEnv<'_>,
        ctx: &CallContext,
        request: OpenRequest,
    ) -> LedgerResult<Vec<Transfer>>;

    fn top_up(
        &mut self,
        env: &LedgerEnv<'_>,
        ctx: &CallContext,
        commitment: &Commitment,
        funding: Funding,
        amount: Amount,
    ) -> LedgerResult<Vec<Transfer>>;

    /// Takes `amount` from the account; only the debit engine calls this.
    fn debit(
        &mut self,
        env: &LedgerEnv<'_>,
        commitment: &Commitment,
        amount: Amount,
    ) -> LedgerResult<DebitSource>;

    /// Closes the account for good and returns whatever it still holds.
    fn withdraw(
        &mut self,
        env: &LedgerEnv<'_>,
        ctx: &CallContext,
        commitment: &Commitment,
    ) -> LedgerResult<Vec<Transfer>>;

    fn get_account(&self, env: &LedgerEnv<'_>, commitment: &Commitment) -> Option<AccountView>;
}

/// Account records, encrypted notes and the per-creator index.
#[derive(Clone, Debug, Default)]
pub struct AccountStore {
    accounts: HashMap<Commitment, Account>,
    encrypted_notes: HashMap<Commitment, EncryptedNote>,
    commitments_by_creator: HashMap<Address, Vec<Commitment>>,
    /// Sum of tracked native balances.
    native_liabilities: Amount,
}

/// State of one commitment before a mutation, for rollback.
#[derive(Clone, Debug)]
pub struct AccountCheckpoint {
    commitment: Commitment,
    account: Option<Account>,
    native_liabilities: Amount,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, commitment: &Commitment) -> Option<&Account> {
        self.accounts.get(commitment)
    }

    pub fn encrypted_note(&self, commitment: &Commitment) -> Option<&EncryptedNote> {
        self.encrypted_notes.get(commitment)
    }

    /// Number of accounts ever opened by `creator`, closed ones included.
    pub fn account_counter(&self, creator: &Address) -> usize {
        self.commitments_by_creator
            .get(creator)
            .map_or(0, Vec::len)
    }

    pub fn commitment_at(&self, creator: &Address, index: usize) -> Option<Commitment> {
        self.commitments_by_creator
            .get(creator)
            .and_then(|commitments| commitments.get(index))
            .copied()
    }

    pub fn native_liabilities(&self) -> Amount {
        self.native_liabilities
    }

    /// Native value held by the ledger that no account claims.
    pub fn native_surplus(&self, env: &LedgerEnv<'_>) -> Amount {
        env.bank
            .balance_of(Asset::Native, env.ledger)
            .saturating_sub(self.native_liabilities)
    }

    pub(crate) fn ensure_fresh(&self, commitment: &Commitment) -> LedgerResult<()> {
        match self.accounts.get(commitment) {
            Some(account) if account.active => Err(LedgerError::AccountAlreadyActive),
            Some(_) => Err(LedgerError::AccountAlreadyExists),
            None => Ok(()),
        }
    }

    pub(crate) fn insert(
        &mut self,
        commitment: Commitment,
        account: Account,
        encrypted_note: EncryptedNote,
    ) -> LedgerResult<()> {
        if account.is_native() {
            self.native_liabilities = self
                .native_liabilities
                .checked_add(account.balance)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        self.accounts.insert(commitment, account);
        self.encrypted_notes.insert(commitment, encrypted_note);
        self.commitments_by_creator
            .entry(account.creator)
            .or_default()
            .push(commitment);
        Ok(())
    }

    pub(crate) fn active(&self, commitment: &Commitment) -> LedgerResult<&Account> {
        self.accounts
            .get(commitment)
            .filter(|account| account.active)
            .ok_or(LedgerError::InactiveAccount)
    }

    pub(crate) fn active_mut(&mut self, commitment: &Commitment) -> LedgerResult<&mut Account> {
        self.accounts
            .get_mut(commitment)
            .filter(|account| account.active)
            .ok_or(LedgerError::InactiveAccount)
    }

    pub(crate) fn credit(&mut self, commitment: &Commitment, amount: Amount) -> LedgerResult<()> {
        let account = self.active_mut(commitment)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        if account.is_native() {
            self.native_liabilities = self
                .native_liabilities
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        Ok(())
    }

    pub(crate) fn take(&mut self, commitment: &Commitment, amount: Amount) -> LedgerResult<()> {
        let account = self.active_mut(commitment)?;
        if account.balance < amount {
            return Err(LedgerError::NotEnoughAccountBalance {
                available: account.balance,
                requested: amount,
            });
        }
        account.balance -= amount;
        if account.is_native() {
            self.native_liabilities = self.native_liabilities.saturating_sub(amount);
        }
        Ok(())
    }

    /// Zeroes and deactivates the account, returning the final balance.
    pub(crate) fn close(&mut self, commitment: &Commitment) -> LedgerResult<Account> {
        let account = self.active_mut(commitment)?;
        let closed = *account;
        account.balance = 0;
        account.active = false;
        if closed.is_native() {
            self.native_liabilities = self.native_liabilities.saturating_sub(closed.balance);
        }
        Ok(closed)
    }

    pub(crate) fn checkpoint(&self, commitment: &Commitment) -> AccountCheckpoint {
        AccountCheckpoint {
            commitment: *commitment,
            account: self.accounts.get(commitment).copied(),
            native_liabilities: self.native_liabilities,
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: AccountCheckpoint) {
        let AccountCheckpoint {
            commitment,
            account,
            native_liabilities,
        } = checkpoint;
        match account {
            Some(previous) => {
                self.accounts.insert(commitment, previous);
            }
            None => {
                if let Some(opened) = self.accounts.remove(&commitment) {
                    self.encrypted_notes.remove(&commitment);
                    if let Some(index) = self.commitments_by_creator.get_mut(&opened.creator) {
                        index.retain(|c| *c != commitment);
                    }
                }
            }
        }
        self.native_liabilities = native_liabilities;
    }

    pub(crate) fn view(&self, commitment: &Commitment) -> Option<AccountView> {
        self.accounts.get(commitment).map(|account| AccountView {
            commitment: *commitment,
            creator: account.creator,
            token: account.token,
            balance: account.balance,
            active: account.active,
            observed_balance: None,
        })
    }
}
