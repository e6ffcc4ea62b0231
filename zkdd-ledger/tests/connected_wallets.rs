use zkdd_common::{AccountSecrets, Address};
use zkdd_ledger::{
    Asset, AssetBank, CallContext, ConnectedWallets, DebitRequest, DirectDebitLedger,
    EncryptedNote, FeePolicy, InMemoryBank, LedgerConfig, LedgerError, Timestamp,
};
use zkdd_test_fixtures::{
    encrypted_note_bytes, ether, fixtures, milli_ether, sign_intent, DeterministicVerifier,
    Parties, SignedIntent,
};

const START: Timestamp = 1_700_000_000;

type Wallets = ConnectedWallets<DeterministicVerifier, InMemoryBank>;

fn parties() -> Parties {
    fixtures().parties()
}

fn at(caller: Address, offset: u64) -> CallContext {
    CallContext::new(caller, START + offset)
}

fn note(account: &AccountSecrets) -> EncryptedNote {
    EncryptedNote::from(encrypted_note_bytes(account))
}

fn debit(intent: &SignedIntent, amount: u128) -> DebitRequest {
    DebitRequest {
        proof: intent.proof,
        signals: intent.signals(),
        amount,
    }
}

fn tokens(wallets: &Wallets, holder: Address) -> u128 {
    wallets
        .bank()
        .balance_of(Asset::Token(parties().token), holder)
}

/// Alice holds 1000 tokens and lets the ledger spend all of them.
fn connected(account: &AccountSecrets) -> Wallets {
    let parties = parties();
    let mut bank = InMemoryBank::new();
    bank.mint(Asset::Token(parties.token), parties.alice, ether(1000))
        .unwrap();
    bank.approve(parties.token, parties.alice, parties.ledger, ether(1000));

    let config = LedgerConfig::new(parties.owner, FeePolicy::dual());
    let mut wallets =
        DirectDebitLedger::connected(parties.ledger, config, DeterministicVerifier, bank);
    wallets
        .add_relayer(&at(parties.owner, 0), parties.relayer)
        .unwrap();
    wallets
        .connect_wallet(
            &at(parties.alice, 0),
            account.commitment,
            parties.token,
            note(account),
        )
        .expect("connect");
    wallets
}

#[test]
fn debits_pull_from_the_wallet() {
    let parties = parties();
    let account = fixtures().account(0);
    let mut wallets = connected(account);

    let view = wallets.get_account(&account.commitment).unwrap();
    assert_eq!(view.balance, ether(1000));
    assert_eq!(view.token, Some(parties.token));
    assert_eq!(wallets.account(&account.commitment).unwrap().balance, 0);

    let intent = sign_intent(account, parties.bob, ether(10), 2, 0, 31).unwrap();
    let receipt = wallets
        .direct_debit(&at(parties.relayer, 1), &debit(&intent, ether(5)))
        .expect("debit");
    assert_eq!(receipt.fees.net, milli_ether(4950));
    assert_eq!(tokens(&wallets, parties.bob), milli_ether(4950));
    assert_eq!(tokens(&wallets, parties.owner), milli_ether(25));
    assert_eq!(tokens(&wallets, parties.relayer), milli_ether(25));
    assert_eq!(tokens(&wallets, parties.alice), ether(995));
    assert_eq!(tokens(&wallets, parties.ledger), 0);
    assert_eq!(
        wallets.bank().allowance(parties.token, parties.alice, parties.ledger),
        ether(995)
    );
    assert_eq!(
        wallets.get_account(&account.commitment).unwrap().balance,
        ether(995)
    );
}

#[test]
fn balance_is_capped_by_the_allowance() {
    let parties = parties();
    let account = fixtures().account(1);
    let mut wallets = connected(account);
    wallets
        .bank_mut()
        .approve(parties.token, parties.alice, parties.ledger, ether(3));
    assert_eq!(
        wallets.get_account(&account.commitment).unwrap().balance,
        ether(3)
    );

    let intent = sign_intent(account, parties.bob, ether(10), 2, 0, 32).unwrap();
    let err = wallets
        .direct_debit(&at(parties.relayer, 1), &debit(&intent, ether(5)))
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::NotEnoughAccountBalance {
            available: ether(3),
            requested: ether(5),
        }
    );
    assert!(wallets
        .payment_intent(&intent.signals().payment_intent)
        .is_none());
}

#[test]
fn custody_operations_are_unsupported() {
    let parties = parties();
    let account = fixtures().account(2);
    let other = fixtures().account(3);
    let mut wallets = connected(account);

    assert_eq!(
        wallets.top_up_tokens(&at(parties.alice, 1), &account.commitment, ether(1)),
        Err(LedgerError::UnsupportedOperation("top up"))
    );
    assert_eq!(
        wallets.deposit_token(
            &at(parties.alice, 1),
            other.commitment,
            parties.token,
            ether(1),
            note(other),
        ),
        Err(LedgerError::UnsupportedOperation("deposit"))
    );
    assert_eq!(
        wallets.deposit_eth(
            &at(parties.alice, 1).with_value(ether(1)),
            other.commitment,
            ether(1),
            note(other),
        ),
        Err(LedgerError::NotTokenAccount)
    );
    assert_eq!(
        wallets.connect_wallet(
            &at(parties.alice, 1),
            account.commitment,
            parties.token,
            note(account),
        ),
        Err(LedgerError::AccountAlreadyActive)
    );
}

#[test]
fn disconnect_is_owner_only_and_final() {
    let parties = parties();
    let account = fixtures().account(4);
    let mut wallets = connected(account);
    let intent = sign_intent(account, parties.bob, ether(10), 5, 0, 33).unwrap();

    assert_eq!(
        wallets.disconnect_wallet(&at(parties.bob, 1), &account.commitment),
        Err(LedgerError::OnlyAccountOwner)
    );
    wallets
        .disconnect_wallet(&at(parties.alice, 2), &account.commitment)
        .expect("disconnect");
    assert_eq!(tokens(&wallets, parties.alice), ether(1000));

    let view = wallets.get_account(&account.commitment).unwrap();
    assert!(!view.active);
    assert_eq!(view.balance, 0);

    assert_eq!(
        wallets.direct_debit(&at(parties.relayer, 3), &debit(&intent, ether(1))),
        Err(LedgerError::InactiveAccount)
    );
    assert_eq!(
        wallets.connect_wallet(
            &at(parties.alice, 4),
            account.commitment,
            parties.token,
            note(account),
        ),
        Err(LedgerError::AccountAlreadyExists)
    );
}
