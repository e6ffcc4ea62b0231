//! Debit authorization engine.
//!
//! Every state-changing entry point runs in the same order:
//!
//! ```text
//! checks -> ledger effects -> settlement transfers
//! ```
//!
//! Balances and intent records are updated before any funds leave the
//! ledger. If settlement fails the effects are rolled back, so a call either
//! applies completely or leaves no trace.

use serde::Serialize;
use tracing::{debug, info, warn};
use zkdd_common::{Address, Commitment, IntentNullifier, PackedProof, PaymentIntentSignals};
use zkdd_verifier::{verify_payment_intent, ProofVerifier};

use crate::{
    accounts::{
        AccountCheckpoint, AccountStrategy, ConnectedAccounts, CustodialAccounts, Funding,
        LedgerEnv, OpenRequest,
    },
    bank::{AssetBank, Transfer},
    config::LedgerConfig,
    error::{LedgerError, LedgerResult},
    fees::FeeSplit,
    intents::{IntentStatus, PaymentIntentRecord, PaymentIntentRegistry},
    types::{Account, AccountView, Amount, CallContext, DebitRequest, EncryptedNote},
};

/// Outcome of a successful debit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitReceipt {
    pub payment_intent: IntentNullifier,
    pub commitment: Commitment,
    pub payee: Address,
    #[serde(with = "zkdd_common::serde_decimal")]
    pub amount: Amount,
    pub fees: FeeSplit,
    /// Receives `fees.relayer_fee`: the caller if allow-listed, else the fee recipient.
    pub relayer_fee_recipient: Address,
    pub withdrawal_count: u64,
    pub status: IntentStatus,
}

pub struct DirectDebitLedger<S, V, B> {
    address: Address,
    config: LedgerConfig,
    accounts: S,
    intents: PaymentIntentRegistry,
    verifier: V,
    bank: B,
}

/// Ledger that custodies deposited funds.
pub type VirtualAccounts<V, B> = DirectDebitLedger<CustodialAccounts, V, B>;
/// Ledger that pulls from payers' wallets through token allowances.
pub type ConnectedWallets<V, B> = DirectDebitLedger<ConnectedAccounts, V, B>;

impl<V: ProofVerifier, B: AssetBank> DirectDebitLedger<CustodialAccounts, V, B> {
    pub fn custodial(address: Address, config: LedgerConfig, verifier: V, bank: B) -> Self {
        Self::new(address, config, CustodialAccounts::new(), verifier, bank)
    }
}

impl<V: ProofVerifier, B: AssetBank> DirectDebitLedger<ConnectedAccounts, V, B> {
    pub fn connected(address: Address, config: LedgerConfig, verifier: V, bank: B) -> Self {
        Self::new(address, config, ConnectedAccounts::new(), verifier, bank)
    }
}

impl<S, V, B> DirectDebitLedger<S, V, B>
where
    S: AccountStrategy,
    V: ProofVerifier,
    B: AssetBank,
{
    pub fn new(
        address: Address,
        config: LedgerConfig,
        accounts: S,
        verifier: V,
        bank: B,
    ) -> Self {
        Self {
            address,
            config,
            accounts,
            intents: PaymentIntentRegistry::new(),
            verifier,
            bank,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Direct access to custody, e.g. to fund callers or grant allowances.
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    // ----- accounts -----

    /// Opens a native-currency account; the call value must cover `amount`.
    pub fn deposit_eth(
        &mut self,
        ctx: &CallContext,
        commitment: Commitment,
        amount: Amount,
        encrypted_note: EncryptedNote,
    ) -> LedgerResult<()> {
        self.open(
            ctx,
            OpenRequest {
                commitment,
                token: None,
                amount,
                encrypted_note,
            },
        )
    }

    /// Opens a token account, pulling `amount` through the caller's allowance.
    pub fn deposit_token(
        &mut self,
        ctx: &CallContext,
        commitment: Commitment,
        token: Address,
        amount: Amount,
        encrypted_note: EncryptedNote,
    ) -> LedgerResult<()> {
        self.open(
            ctx,
            OpenRequest {
                commitment,
                token: Some(token),
                amount,
                encrypted_note,
            },
        )
    }

    /// Registers a wallet whose allowance backs the account.
    pub fn connect_wallet(
        &mut self,
        ctx: &CallContext,
        commitment: Commitment,
        token: Address,
        encrypted_note: EncryptedNote,
    ) -> LedgerResult<()> {
        self.open(
            ctx,
            OpenRequest {
                commitment,
                token: Some(token),
                amount: 0,
                encrypted_note,
            },
        )
    }

    pub fn top_up_eth(
        &mut self,
        ctx: &CallContext,
        commitment: &Commitment,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.top_up(ctx, commitment, Funding::Native, amount)
    }

    pub fn top_up_tokens(
        &mut self,
        ctx: &CallContext,
        commitment: &Commitment,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.top_up(ctx, commitment, Funding::Token, amount)
    }

    /// Closes the account and returns its balance to the creator.
    pub fn withdraw(&mut self, ctx: &CallContext, commitment: &Commitment) -> LedgerResult<()> {
        let checkpoint = self.accounts.store().checkpoint(commitment);
        let env = LedgerEnv {
            ledger: self.address,
            bank: &self.bank,
        };
        let transfers = self.accounts.withdraw(&env, ctx, commitment)?;
        self.settle(checkpoint, None, &transfers)?;
        info!(%commitment, creator = %ctx.caller, "account closed");
        Ok(())
    }

    pub fn disconnect_wallet(
        &mut self,
        ctx: &CallContext,
        commitment: &Commitment,
    ) -> LedgerResult<()> {
        self.withdraw(ctx, commitment)
    }

    fn open(&mut self, ctx: &CallContext, request: OpenRequest) -> LedgerResult<()> {
        let commitment = request.commitment;
        let checkpoint = self.accounts.store().checkpoint(&commitment);
        let env = LedgerEnv {
            ledger: self.address,
            bank: &self.bank,
        };
        let transfers = self.accounts.open(&env, ctx, request)?;
        self.settle(checkpoint, None, &transfers)?;
        info!(%commitment, creator = %ctx.caller, "account opened");
        Ok(())
    }

    fn top_up(
        &mut self,
        ctx: &CallContext,
        commitment: &Commitment,
        funding: Funding,
        amount: Amount,
    ) -> LedgerResult<()> {
        let checkpoint = self.accounts.store().checkpoint(commitment);
        let env = LedgerEnv {
            ledger: self.address,
            bank: &self.bank,
        };
        let transfers = self
            .accounts
            .top_up(&env, ctx, commitment, funding, amount)?;
        self.settle(checkpoint, None, &transfers)?;
        debug!(%commitment, amount, "account topped up");
        Ok(())
    }

    // ----- debits -----

    /// Pulls one scheduled payment authorized by a payment-intent proof.
    pub fn direct_debit(
        &mut self,
        ctx: &CallContext,
        request: &DebitRequest,
    ) -> LedgerResult<DebitReceipt> {
        let signals = &request.signals;

        // 1. The proof must bind all six public signals.
        self.ensure_proof(&request.proof, signals)?;

        // 2. Per-debit cap.
        if request.amount > signals.max_debit_amount {
            return Err(LedgerError::PaymentNotAuthorized {
                amount: request.amount,
                max: signals.max_debit_amount,
            });
        }

        // 3-5. Cancellation, remaining debits, cadence.
        self.intents.check_debit(signals, ctx.timestamp)?;

        // 6. Account state, then effects.
        let checkpoint = self.accounts.store().checkpoint(&signals.commitment);
        let env = LedgerEnv {
            ledger: self.address,
            bank: &self.bank,
        };
        let source = self
            .accounts
            .debit(&env, &signals.commitment, request.amount)?;
        let (previous, record) = self.intents.record_debit(signals, ctx.timestamp);

        // 7. Settlement.
        let fees = self.config.fee_policy().split(request.amount);
        let fee_recipient = self.config.fee_recipient();
        let relayer_fee_recipient = if self.config.is_relayer(&ctx.caller) {
            ctx.caller
        } else {
            fee_recipient
        };
        let transfers: Vec<Transfer> = [
            (signals.payee, fees.net),
            (fee_recipient, fees.protocol_fee),
            (relayer_fee_recipient, fees.relayer_fee),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(to, amount)| source.payout(self.address, to, amount))
        .collect();
        self.settle(
            checkpoint,
            Some((signals.payment_intent, previous)),
            &transfers,
        )?;

        info!(
            payment_intent = %signals.payment_intent,
            payee = %signals.payee,
            amount = request.amount,
            net = fees.net,
            withdrawal_count = record.withdrawal_count,
            debit_times = signals.debit_times,
            "direct debit executed"
        );

        Ok(DebitReceipt {
            payment_intent: signals.payment_intent,
            commitment: signals.commitment,
            payee: signals.payee,
            amount: request.amount,
            fees,
            relayer_fee_recipient,
            withdrawal_count: record.withdrawal_count,
            status: record.status,
        })
    }

    /// Stops an intent for good. Only the account owner or the payee may cancel.
    pub fn cancel_payment_intent(
        &mut self,
        ctx: &CallContext,
        proof: &PackedProof,
        signals: &PaymentIntentSignals,
    ) -> LedgerResult<PaymentIntentRecord> {
        self.ensure_proof(proof, signals)?;

        let owner = self
            .accounts
            .store()
            .get(&signals.commitment)
            .map(|account| account.creator);
        if ctx.caller != signals.payee && owner != Some(ctx.caller) {
            return Err(LedgerError::OnlyRelatedPartiesCanCancel);
        }

        let record = self.intents.cancel(signals.payment_intent);
        info!(
            payment_intent = %signals.payment_intent,
            caller = %ctx.caller,
            "payment intent cancelled"
        );
        Ok(record)
    }

    fn ensure_proof(
        &self,
        proof: &PackedProof,
        signals: &PaymentIntentSignals,
    ) -> LedgerResult<()> {
        if !verify_payment_intent(&self.verifier, proof, signals) {
            warn!(payment_intent = %signals.payment_intent, "payment intent proof rejected");
            return Err(LedgerError::InvalidProof);
        }
        Ok(())
    }

    fn settle(
        &mut self,
        checkpoint: AccountCheckpoint,
        intent: Option<(IntentNullifier, Option<PaymentIntentRecord>)>,
        transfers: &[Transfer],
    ) -> LedgerResult<()> {
        if let Err(err) = self.bank.execute(transfers) {
            warn!(error = %err, "settlement failed, rolling back");
            if let Some((payment_intent, previous)) = intent {
                self.intents.restore(payment_intent, previous);
            }
            self.accounts.store_mut().rollback(checkpoint);
            return Err(err.into());
        }
        Ok(())
    }

    // ----- reads -----

    pub fn calculate_fee(&self, amount: Amount) -> FeeSplit {
        self.config.fee_policy().split(amount)
    }

    pub fn get_account(&self, commitment: &Commitment) -> Option<AccountView> {
        let env = LedgerEnv {
            ledger: self.address,
            bank: &self.bank,
        };
        self.accounts.get_account(&env, commitment)
    }

    pub fn account(&self, commitment: &Commitment) -> Option<&Account> {
        self.accounts.store().get(commitment)
    }

    pub fn encrypted_note(&self, commitment: &Commitment) -> Option<&EncryptedNote> {
        self.accounts.store().encrypted_note(commitment)
    }

    pub fn account_counter(&self, creator: &Address) -> usize {
        self.accounts.store().account_counter(creator)
    }

    pub fn commitment_at(&self, creator: &Address, index: usize) -> Option<Commitment> {
        self.accounts.store().commitment_at(creator, index)
    }

    pub fn payment_intent(
        &self,
        payment_intent: &IntentNullifier,
    ) -> Option<&PaymentIntentRecord> {
        self.intents.get(payment_intent)
    }

    // ----- administration -----

    pub fn update_fee_divider(&mut self, ctx: &CallContext, divider: Amount) -> LedgerResult<()> {
        let capability = self.config.authorize(ctx.caller)?;
        self.config.update_fee_divider(&capability, divider)
    }

    pub fn set_fee_recipient(
        &mut self,
        ctx: &CallContext,
        recipient: Address,
    ) -> LedgerResult<()> {
        let capability = self.config.authorize(ctx.caller)?;
        self.config.set_fee_recipient(&capability, recipient)
    }

    pub fn add_relayer(&mut self, ctx: &CallContext, relayer: Address) -> LedgerResult<bool> {
        let capability = self.config.authorize(ctx.caller)?;
        self.config.add_relayer(&capability, relayer)
    }

    pub fn remove_relayer(
        &mut self,
        ctx: &CallContext,
        relayer: &Address,
    ) -> LedgerResult<bool> {
        let capability = self.config.authorize(ctx.caller)?;
        self.config.remove_relayer(&capability, relayer)
    }
}
