//! Shared test doubles for the direct-debit crates.
//!
//! The real prover and verifier live outside this workspace. Tests use a
//! deterministic pair instead: the "proof" is a keyed blake3 digest of the six
//! public signals spread over eight base-field words, so any change to a
//! signal makes verification fail while honest proofs always pass.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::OnceCell;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use zkdd_common::{
    encryption::{
        pack_encrypted_message, packed_message_bytes, EncryptedMessage, NoteCipher,
        ENCRYPTION_VERSION,
    },
    fr_to_bytes,
    intent::{PaymentIntentSecret, PaymentIntentWitness},
    note::{create_account_secrets, note_to_hex},
    AccountSecrets, Address, Fr, PackedProof, PaymentIntentSignals, SecretPair,
    PUBLIC_SIGNAL_COUNT,
};
use zkdd_verifier::{FullProof, PaymentIntentProver, ProofVerifier};

const PROOF_DOMAIN: &str = "zkdd test fixtures 2025 deterministic groth16 proof";
const ACCOUNT_SEED: u64 = 0x5eed_d1ec_7deb_1700;

static FIXTURES: OnceCell<TestFixtures> = OnceCell::new();

/// One-unit helper: `ether(5)` is `5 * 10^18` base units.
pub const fn ether(amount: u128) -> u128 {
    amount * 1_000_000_000_000_000_000
}

/// Fractional helper: `milli_ether(5)` is `0.005 * 10^18`.
pub const fn milli_ether(amount: u128) -> u128 {
    amount * 1_000_000_000_000_000
}

#[derive(Clone, Copy, Debug)]
pub struct Parties {
    pub owner: Address,
    pub alice: Address,
    pub bob: Address,
    pub relayer: Address,
    pub ledger: Address,
    pub token: Address,
}

pub struct TestFixtures {
    parties: Parties,
    accounts: Vec<AccountSecrets>,
}

impl TestFixtures {
    pub fn parties(&self) -> Parties {
        self.parties
    }

    /// Deterministically generated account secrets, stable across runs.
    pub fn account(&self, index: usize) -> &AccountSecrets {
        &self.accounts[index % self.accounts.len()]
    }
}

/// Return lazily constructed fixtures shared across tests.
pub fn fixtures() -> &'static TestFixtures {
    FIXTURES.get_or_init(build_fixtures)
}

fn build_fixtures() -> TestFixtures {
    let mut rng = ChaCha20Rng::seed_from_u64(ACCOUNT_SEED);
    let accounts = (0..8)
        .map(|_| {
            create_account_secrets(SecretPair::random(&mut rng))
                .expect("31-byte secrets always encode")
        })
        .collect();
    TestFixtures {
        parties: Parties {
            owner: Address::from_label("owner"),
            alice: Address::from_label("alice"),
            bob: Address::from_label("bob"),
            relayer: Address::from_label("relayer"),
            ledger: Address::from_label("ledger"),
            token: Address::from_label("token"),
        },
        accounts,
    }
}

/// Fresh account secrets from a seeded RNG.
pub fn account_from_seed(seed: u64) -> AccountSecrets {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    create_account_secrets(SecretPair::random(&mut rng)).expect("31-byte secrets always encode")
}

fn proof_for(signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> PackedProof {
    let mut hasher = blake3::Hasher::new_derive_key(PROOF_DOMAIN);
    for signal in signals {
        hasher.update(&fr_to_bytes(signal));
    }
    let mut words = [0u8; 8 * 31];
    hasher.finalize_xof().fill(&mut words);

    // A leading zero byte keeps each word below the base-field modulus.
    let mut bytes = Vec::with_capacity(8 * 32);
    for chunk in words.chunks_exact(31) {
        bytes.push(0);
        bytes.extend_from_slice(chunk);
    }
    PackedProof::from_bytes(&bytes).expect("words below 2^248 are canonical")
}

/// Produces proofs the [`DeterministicVerifier`] accepts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicProver;

impl DeterministicProver {
    pub fn prove_signals(&self, signals: &PaymentIntentSignals) -> PackedProof {
        proof_for(&signals.to_field_elements())
    }
}

impl PaymentIntentProver for DeterministicProver {
    fn prove(&self, witness: &PaymentIntentWitness) -> Result<FullProof> {
        witness
            .check()
            .map_err(|err| anyhow!("refusing to prove invalid witness: {err}"))?;
        let packed = self.prove_signals(&witness.signals);
        Ok(FullProof {
            proof: packed.unpack().to_snarkjs(),
            public_signals: witness.signals.to_decimal_strings(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicVerifier;

impl ProofVerifier for DeterministicVerifier {
    fn verify(&self, proof: &PackedProof, signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> bool {
        proof_for(signals) == *proof
    }
}

/// A debit authorization ready to submit: signals plus matching proof.
#[derive(Clone, Debug)]
pub struct SignedIntent {
    pub witness: PaymentIntentWitness,
    pub proof: PackedProof,
}

impl SignedIntent {
    pub fn signals(&self) -> PaymentIntentSignals {
        self.witness.signals
    }
}

/// Builds and proves a payment intent for `account` with an explicit nonce.
pub fn sign_intent(
    account: &AccountSecrets,
    payee: Address,
    max_debit_amount: u128,
    debit_times: u64,
    debit_interval: u64,
    nonce: u64,
) -> Result<SignedIntent> {
    let intent = PaymentIntentSecret {
        note: note_to_hex(&account.pair)?,
        payee,
        max_debit_amount,
        debit_times,
        debit_interval,
    };
    let witness = PaymentIntentWitness::build(&intent, Fr::from(nonce))?;
    let proof = DeterministicProver.prove_signals(&witness.signals);
    Ok(SignedIntent { witness, proof })
}

/// "Encrypts" by storing the note in the ciphertext slot, for tests only.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextCipher;

impl NoteCipher for PlaintextCipher {
    type Error = anyhow::Error;

    fn encrypt(&self, public_key: &[u8], note: &str) -> Result<EncryptedMessage> {
        let mut ephem = [0u8; 32];
        for (dst, src) in ephem.iter_mut().zip(public_key) {
            *dst = *src;
        }
        Ok(EncryptedMessage {
            version: ENCRYPTION_VERSION.to_string(),
            nonce: STANDARD.encode([0u8; 24]),
            ephem_public_key: STANDARD.encode(ephem),
            ciphertext: STANDARD.encode(note.as_bytes()),
        })
    }

    fn decrypt(&self, _private_key: &[u8], message: &EncryptedMessage) -> Result<String> {
        let bytes = STANDARD
            .decode(&message.ciphertext)
            .context("ciphertext is not base64")?;
        String::from_utf8(bytes).context("ciphertext is not a UTF-8 note")
    }
}

/// Packed encrypted-note bytes for `account`, as stored by the ledger.
pub fn encrypted_note_bytes(account: &AccountSecrets) -> Vec<u8> {
    let note = note_to_hex(&account.pair).expect("fixture secrets always encode");
    let message = PlaintextCipher
        .encrypt(&[7u8; 32], &note)
        .expect("plaintext encryption cannot fail");
    let packed = pack_encrypted_message(&message).expect("fixture message packs");
    packed_message_bytes(&packed).expect("packed message is valid hex")
}
