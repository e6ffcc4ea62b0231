//! Fund movements outside the ledger's own bookkeeping.
//!
//! The ledger never moves value itself. It plans a batch of [`Transfer`]s and
//! hands the batch to an [`AssetBank`], which applies all of it or none of it.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkdd_common::Address;

use crate::types::Amount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Native,
    Token(Address),
}

impl Asset {
    pub fn from_token(token: Option<Address>) -> Self {
        token.map_or(Asset::Native, Asset::Token)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Token(token) => write!(f, "token {token}"),
        }
    }
}

/// One movement of funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub asset: Asset,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Set when `from` is debited through an allowance granted to `spender`.
    pub spender: Option<Address>,
}

impl Transfer {
    pub fn direct(asset: Asset, from: Address, to: Address, amount: Amount) -> Self {
        Self {
            asset,
            from,
            to,
            amount,
            spender: None,
        }
    }

    pub fn pull(
        token: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: Amount,
    ) -> Self {
        Self {
            asset: Asset::Token(token),
            from: owner,
            to,
            amount,
            spender: Some(spender),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("{holder} holds {available} of {asset}, needs {needed}")]
    InsufficientBalance {
        asset: Asset,
        holder: Address,
        available: Amount,
        needed: Amount,
    },

    #[error("{spender} may spend {available} of {owner}'s {token}, needs {needed}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        available: Amount,
        needed: Amount,
    },

    #[error("native currency cannot be pulled through an allowance")]
    NativeAllowance,

    #[error("balance overflow")]
    Overflow,
}

/// Custody of native currency and fungible tokens.
pub trait AssetBank {
    fn balance_of(&self, asset: Asset, holder: Address) -> Amount;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount;

    /// Applies every transfer in order, or none of them.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), BankError>;
}

/// Hash-map backed bank for tests and local tooling.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBank {
    balances: HashMap<(Asset, Address), Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, asset: Asset, to: Address, amount: Amount) -> Result<(), BankError> {
        let balance = self.balances.entry((asset, to)).or_default();
        *balance = balance.checked_add(amount).ok_or(BankError::Overflow)?;
        Ok(())
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: Amount) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn apply(&mut self, transfer: &Transfer) -> Result<(), BankError> {
        if let Some(spender) = transfer.spender {
            let Asset::Token(token) = transfer.asset else {
                return Err(BankError::NativeAllowance);
            };
            let key = (token, transfer.from, spender);
            let available = self.allowances.get(&key).copied().unwrap_or(0);
            if available < transfer.amount {
                return Err(BankError::InsufficientAllowance {
                    token,
                    owner: transfer.from,
                    spender,
                    available,
                    needed: transfer.amount,
                });
            }
            self.allowances.insert(key, available - transfer.amount);
        }

        let available = self.balance_of(transfer.asset, transfer.from);
        if available < transfer.amount {
            return Err(BankError::InsufficientBalance {
                asset: transfer.asset,
                holder: transfer.from,
                available,
                needed: transfer.amount,
            });
        }
        self.balances
            .insert((transfer.asset, transfer.from), available - transfer.amount);
        self.mint(transfer.asset, transfer.to, transfer.amount)
    }
}

impl AssetBank for InMemoryBank {
    fn balance_of(&self, asset: Asset, holder: Address) -> Amount {
        self.balances.get(&(asset, holder)).copied().unwrap_or(0)
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), BankError> {
        let snapshot = (self.balances.clone(), self.allowances.clone());
        for transfer in transfers {
            if let Err(err) = self.apply(transfer) {
                (self.balances, self.allowances) = snapshot;
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn failed_batch_leaves_balances_untouched() {
        let mut bank = InMemoryBank::new();
        bank.mint(Asset::Native, addr("a"), 10).unwrap();
        let batch = [
            Transfer::direct(Asset::Native, addr("a"), addr("b"), 6),
            Transfer::direct(Asset::Native, addr("a"), addr("c"), 6),
        ];
        assert!(matches!(
            bank.execute(&batch),
            Err(BankError::InsufficientBalance { available: 4, .. })
        ));
        assert_eq!(bank.balance_of(Asset::Native, addr("a")), 10);
        assert_eq!(bank.balance_of(Asset::Native, addr("b")), 0);
    }

    #[test]
    fn pulls_consume_allowance() {
        let token = addr("token");
        let mut bank = InMemoryBank::new();
        bank.mint(Asset::Token(token), addr("owner"), 100).unwrap();
        bank.approve(token, addr("owner"), addr("ledger"), 30);

        let pull = Transfer::pull(token, addr("owner"), addr("ledger"), addr("payee"), 20);
        bank.execute(&[pull]).unwrap();
        assert_eq!(bank.allowance(token, addr("owner"), addr("ledger")), 10);
        assert_eq!(bank.balance_of(Asset::Token(token), addr("payee")), 20);
        assert!(matches!(
            bank.execute(&[pull]),
            Err(BankError::InsufficientAllowance { available: 10, .. })
        ));
    }
}
