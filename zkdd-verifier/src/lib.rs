// zkdd/zkdd-verifier/src/lib.rs

//! Boundary between the ledger and the external Groth16 proving system.
//!
//! The ledger never checks pairings itself. It hands a packed proof and the
//! six public signals to a [`ProofVerifier`] and treats the boolean answer as
//! final.

use std::{rc::Rc, sync::Arc};

use anyhow::{ensure, Context, Result};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zkdd_common::{
    intent::{PaymentIntentSecret, PaymentIntentWitness},
    proof::SnarkjsProof,
    Fr, Groth16Proof, PackedProof, PaymentIntentSignals, PUBLIC_SIGNAL_COUNT,
};

pub mod vk;

pub use vk::{load_verification_key, LoadedVerificationKey, VerificationKey};

/// Accepts or rejects a proof against the payment-intent verification key.
pub trait ProofVerifier {
    fn verify(&self, proof: &PackedProof, signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> bool;
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for &V {
    fn verify(&self, proof: &PackedProof, signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> bool {
        (**self).verify(proof, signals)
    }
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for Box<V> {
    fn verify(&self, proof: &PackedProof, signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> bool {
        (**self).verify(proof, signals)
    }
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for Rc<V> {
    fn verify(&self, proof: &PackedProof, signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> bool {
        (**self).verify(proof, signals)
    }
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for Arc<V> {
    fn verify(&self, proof: &PackedProof, signals: &[Fr; PUBLIC_SIGNAL_COUNT]) -> bool {
        (**self).verify(proof, signals)
    }
}

/// Produces payment-intent proofs from a checked witness.
pub trait PaymentIntentProver {
    fn prove(&self, witness: &PaymentIntentWitness) -> Result<FullProof>;
}

/// Proof plus public signals, in the JSON shape snarkjs `fullProve` returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProof {
    pub proof: SnarkjsProof,
    pub public_signals: Vec<String>,
}

impl FullProof {
    pub fn packed(&self) -> Result<PackedProof> {
        Ok(Groth16Proof::from_snarkjs(&self.proof)
            .context("failed to parse snarkjs proof")?
            .pack())
    }

    pub fn signals(&self) -> Result<PaymentIntentSignals> {
        PaymentIntentSignals::from_decimal_strings(&self.public_signals)
            .context("failed to parse public signals")
    }
}

pub fn verify_payment_intent<V: ProofVerifier + ?Sized>(
    verifier: &V,
    proof: &PackedProof,
    signals: &PaymentIntentSignals,
) -> bool {
    verifier.verify(proof, &signals.to_field_elements())
}

/// Verifies a full proof using only its first six public signals.
pub fn verify_six_public_signals<V: ProofVerifier + ?Sized>(
    verifier: &V,
    full_proof: &FullProof,
) -> Result<bool> {
    let signals = full_proof.signals()?;
    let packed = full_proof.packed()?;
    Ok(verify_payment_intent(verifier, &packed, &signals))
}

/// Builds a fresh payment intent and proves it.
pub fn create_payment_intent<P, R>(
    prover: &P,
    intent: &PaymentIntentSecret,
    rng: &mut R,
) -> Result<(PaymentIntentWitness, FullProof)>
where
    P: PaymentIntentProver + ?Sized,
    R: RngCore + CryptoRng,
{
    let witness =
        PaymentIntentWitness::random(intent, rng).context("failed to build payment intent")?;
    witness.check().context("payment intent witness is inconsistent")?;
    tracing::debug!(
        payment_intent = %witness.signals.payment_intent,
        payee = %witness.signals.payee,
        "proving payment intent"
    );
    let full_proof = prover.prove(&witness)?;
    ensure!(
        full_proof.public_signals.len() >= PUBLIC_SIGNAL_COUNT,
        "prover returned {} public signals, expected {}",
        full_proof.public_signals.len(),
        PUBLIC_SIGNAL_COUNT
    );
    Ok((witness, full_proof))
}
